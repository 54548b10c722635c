use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing required fields: {}", .missing_fields.join(", "))]
    Validation { missing_fields: Vec<&'static str> },

    #[error("track with uuid {uuid} already exists")]
    Conflict { uuid: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
