use rusqlite::Connection;

use crate::storage::query;

pub mod tables {
    pub const MUSIC_TRACKS: &str = "music_tracks";

    pub const ALL_TABLES: &[&str] = &[MUSIC_TRACKS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const UUID: &str = "uuid";
    pub const ORIGINAL_UUID: &str = "original_uuid";
    pub const ALBUM_COVER: &str = "album_cover";
    pub const ALBUM_TITLE: &str = "album_title";
    pub const LABEL: &str = "label";
    pub const LABEL_LOGO: &str = "label_logo";
    pub const BAND_NAME: &str = "band_name";
    pub const ARTIST_PHOTO: &str = "artist_photo";
    pub const ARTIST_MAIN: &str = "artist_main";
    pub const INSTRUMENT: &str = "instrument";
    pub const OTHER_ARTIST_PLAYING: &str = "other_artist_playing";
    pub const OTHER_INSTRUMENT: &str = "other_instrument";
    pub const YEAR_RECORDED: &str = "year_recorded";
    pub const YEAR_RELEASED: &str = "year_released";
    pub const SONG_ORDER: &str = "song_order";
    pub const SONG_TITLE: &str = "song_title";
    pub const COMPOSER: &str = "composer";
    pub const SONG_FILE: &str = "song_file";
    pub const CREATED_AT: &str = "created_at";
}

pub use columns::*;
pub use tables::*;

// AUTOINCREMENT keeps ids from ever being reused
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS music_tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    original_uuid TEXT,
    album_cover TEXT,
    album_title TEXT,
    label TEXT,
    label_logo TEXT,
    band_name TEXT,
    artist_photo TEXT,
    artist_main TEXT,
    instrument TEXT,
    other_artist_playing TEXT,
    other_instrument TEXT,
    year_recorded INTEGER,
    year_released INTEGER,
    song_order INTEGER,
    song_title TEXT NOT NULL,
    composer TEXT,
    song_file TEXT,
    created_at TEXT NOT NULL
);
"#;

/// creates the tables and registers the SQL functions searches rely on
pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    query::register_case_folding(conn)?;
    conn.execute_batch(SCHEMA)
}
