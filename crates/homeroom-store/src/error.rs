use thiserror::Error;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A group with this name already exists (names are unique).
    #[error("group already exists: {0}")]
    GroupExists(String),

    /// The timezone identifier is not a known IANA zone.
    #[error("invalid timezone identifier: {0}")]
    InvalidTimezone(String),

    /// No member with the given name exists.
    #[error("member not found: {0}")]
    MemberNotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
