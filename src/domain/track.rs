use serde::{Deserialize, Serialize};

/// A persisted music track record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub uuid: String,
    pub original_uuid: Option<String>,
    pub album_cover: Option<String>,
    pub album_title: Option<String>,
    pub label: Option<String>,
    pub label_logo: Option<String>,
    pub band_name: Option<String>,
    pub artist_photo: Option<String>,
    pub artist_main: Option<String>,
    pub instrument: Option<String>,
    pub other_artist_playing: Option<String>,
    pub other_instrument: Option<String>,
    pub year_recorded: Option<i64>,
    pub year_released: Option<i64>,
    pub song_order: Option<i64>,
    pub song_title: String,
    pub composer: Option<String>,
    pub song_file: Option<String>,
    pub created_at: String,
}

/// Candidate for insertion.
///
/// Everything is optional here so that the store can report exactly which
/// required fields are missing. `id` is accepted only to be discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTrack {
    pub id: Option<i64>,
    pub uuid: Option<String>,
    pub original_uuid: Option<String>,
    pub album_cover: Option<String>,
    pub album_title: Option<String>,
    pub label: Option<String>,
    pub label_logo: Option<String>,
    pub band_name: Option<String>,
    pub artist_photo: Option<String>,
    pub artist_main: Option<String>,
    pub instrument: Option<String>,
    pub other_artist_playing: Option<String>,
    pub other_instrument: Option<String>,
    pub year_recorded: Option<i64>,
    pub year_released: Option<i64>,
    pub song_order: Option<i64>,
    pub song_title: Option<String>,
    pub composer: Option<String>,
    pub song_file: Option<String>,
    pub created_at: Option<String>,
}

#[cfg(test)]
impl NewTrack {
    pub fn new(uuid: impl Into<String>, song_title: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            song_title: Some(song_title.into()),
            ..Default::default()
        }
    }
}

impl NewTrack {
    /// Fills what the API layer owns: a fresh uuid when none was given and
    /// the creation timestamp.
    pub fn prepared(mut self, created_at: String) -> Self {
        if self.uuid.as_deref().is_none_or(str::is_empty) {
            self.uuid = Some(uuid::Uuid::new_v4().to_string());
        }
        self.created_at = Some(created_at);
        self
    }

    /// names of required fields that are absent or empty
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [("uuid", &self.uuid), ("song_title", &self.song_title)]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| name)
            .collect()
    }
}
