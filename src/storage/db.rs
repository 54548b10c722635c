use std::{path::Path, time::Duration};

use anyhow::anyhow;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

use crate::{
    config::Database,
    storage::{error::StorageError, schema},
};

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// opens the configured database and makes sure the schema exists
pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = if config.in_memory {
        open_in_memory()?
    } else {
        let path = config.path.as_ref().ok_or_else(|| {
            StorageError::Internal(anyhow!("database path is required when in_memory = false"))
        })?;
        log::info!("Opening database at {}", path.to_string_lossy());
        open_from_file(path)?
    };
    db.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    schema::init(&db)?;
    Ok(db)
}

/// current UTC time as RFC 3339 with a `Z` suffix
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
