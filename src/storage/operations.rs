use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use columns::*;
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
    named_params, params, params_from_iter,
};
use tables::*;

use crate::{
    config,
    domain::track::{NewTrack, Track},
    storage::{
        db::{self, utc_timestamp},
        error::StorageError,
        query::TrackFilter,
        schema::{columns, tables},
    },
};

/// Append-only store of track metadata.
///
/// Owns a single connection; every operation holds it for its whole duration,
/// so the store can be shared between threads behind an `Arc`.
pub struct MetadataStore {
    pub(crate) db: Mutex<Connection>,
}

const TRACK_COLUMNS: &str = "id, uuid, original_uuid, album_cover, album_title, label, \
     label_logo, band_name, artist_photo, artist_main, instrument, other_artist_playing, \
     other_instrument, year_recorded, year_released, song_order, song_title, composer, \
     song_file, created_at";

fn row_to_track(row: &Row) -> Result<Track, rusqlite::Error> {
    Ok(Track {
        id: row.get(ID)?,
        uuid: row.get(UUID)?,
        original_uuid: row.get(ORIGINAL_UUID)?,
        album_cover: row.get(ALBUM_COVER)?,
        album_title: row.get(ALBUM_TITLE)?,
        label: row.get(LABEL)?,
        label_logo: row.get(LABEL_LOGO)?,
        band_name: row.get(BAND_NAME)?,
        artist_photo: row.get(ARTIST_PHOTO)?,
        artist_main: row.get(ARTIST_MAIN)?,
        instrument: row.get(INSTRUMENT)?,
        other_artist_playing: row.get(OTHER_ARTIST_PLAYING)?,
        other_instrument: row.get(OTHER_INSTRUMENT)?,
        year_recorded: row.get(YEAR_RECORDED)?,
        year_released: row.get(YEAR_RELEASED)?,
        song_order: row.get(SONG_ORDER)?,
        song_title: row.get(SONG_TITLE)?,
        composer: row.get(COMPOSER)?,
        song_file: row.get(SONG_FILE)?,
        created_at: row.get(CREATED_AT)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Writes one validated track. The UNIQUE(uuid) constraint is the final
/// arbiter of duplicates, whatever checks ran before.
fn insert_row(tx: &Transaction, uuid: &str, track: &NewTrack) -> Result<i64, StorageError> {
    let created_at = track.created_at.clone().unwrap_or_else(utc_timestamp);

    let inserted = tx.execute(
        &format!(
            "INSERT INTO {MUSIC_TRACKS} (
                uuid, original_uuid, album_cover, album_title, label, label_logo,
                band_name, artist_photo, artist_main, instrument, other_artist_playing,
                other_instrument, year_recorded, year_released, song_order, song_title,
                composer, song_file, created_at
            ) VALUES (
                :uuid, :original_uuid, :album_cover, :album_title, :label, :label_logo,
                :band_name, :artist_photo, :artist_main, :instrument, :other_artist_playing,
                :other_instrument, :year_recorded, :year_released, :song_order, :song_title,
                :composer, :song_file, :created_at
            )"
        ),
        named_params! {
            ":uuid": uuid,
            ":original_uuid": track.original_uuid,
            ":album_cover": track.album_cover,
            ":album_title": track.album_title,
            ":label": track.label,
            ":label_logo": track.label_logo,
            ":band_name": track.band_name,
            ":artist_photo": track.artist_photo,
            ":artist_main": track.artist_main,
            ":instrument": track.instrument,
            ":other_artist_playing": track.other_artist_playing,
            ":other_instrument": track.other_instrument,
            ":year_recorded": track.year_recorded,
            ":year_released": track.year_released,
            ":song_order": track.song_order,
            ":song_title": track.song_title,
            ":composer": track.composer,
            ":song_file": track.song_file,
            ":created_at": created_at,
        },
    );

    match inserted {
        Ok(_) => Ok(tx.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(StorageError::Conflict {
            uuid: uuid.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

impl MetadataStore {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: Connection) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.db.lock().map_err(|e| {
            StorageError::Internal(anyhow!("Could not access metadata store under lock: {e}"))
        })
    }

    /// Validates and appends a track, returning it as persisted.
    ///
    /// Any `id` on the candidate is ignored. Fails with
    /// [`StorageError::Validation`] when `uuid` or `song_title` is missing or
    /// empty, and with [`StorageError::Conflict`] when the uuid is taken.
    pub fn insert(&self, candidate: NewTrack) -> Result<Track, StorageError> {
        let missing_fields = candidate.missing_required_fields();
        if !missing_fields.is_empty() {
            let err = StorageError::Validation { missing_fields };
            log::error!("Rejected track: {err}");
            return Err(err);
        }

        if let Some(id) = candidate.id {
            log::debug!("Discarding caller supplied id {id}");
        }
        let uuid = candidate.uuid.clone().unwrap_or_default();

        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock up front, so the duplicate check and
        // the insert cannot interleave with another writer
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                &format!("SELECT {ID} FROM {MUSIC_TRACKS} WHERE {UUID} = ?1"),
                params![uuid],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            let err = StorageError::Conflict { uuid };
            log::error!("Rejected track: {err}");
            return Err(err);
        }

        let id = insert_row(&tx, &uuid, &candidate).inspect_err(|e| {
            log::error!("Error inserting track {uuid}: {e}");
        })?;

        let track = tx.query_row(
            &format!("SELECT {TRACK_COLUMNS} FROM {MUSIC_TRACKS} WHERE {ID} = ?1"),
            params![id],
            row_to_track,
        )?;

        tx.commit()?;
        log::info!("Inserted track {} ({})", track.id, track.uuid);
        Ok(track)
    }

    /// point lookup by store assigned id
    pub fn fetch_by_id(&self, id: i64) -> Result<Option<Track>, StorageError> {
        let conn = self.conn()?;
        let track = conn
            .query_row(
                &format!("SELECT {TRACK_COLUMNS} FROM {MUSIC_TRACKS} WHERE {ID} = ?1"),
                params![id],
                row_to_track,
            )
            .optional()
            .inspect_err(|e| log::error!("Database error fetching track {id}: {e}"))?;
        Ok(track)
    }

    /// all tracks in insertion order
    pub fn fetch_all(&self) -> Result<Vec<Track>, StorageError> {
        self.search(&TrackFilter::default())
    }

    /// Tracks matching every supplied predicate of `filter`, in insertion
    /// order. An empty filter returns everything.
    pub fn search(&self, filter: &TrackFilter) -> Result<Vec<Track>, StorageError> {
        let clause = filter.where_clause();
        let sql = format!(
            "SELECT {TRACK_COLUMNS} FROM {MUSIC_TRACKS}{} ORDER BY {ID}",
            clause.sql
        );

        let conn = self.conn()?;
        let tracks = (|| -> Result<Vec<Track>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params_from_iter(clause.params.iter()), row_to_track)?
                .collect::<Result<Vec<_>, _>>()
        })()
        .inspect_err(|e| log::error!("Database error searching tracks: {e}"))?;

        Ok(tracks)
    }
}
