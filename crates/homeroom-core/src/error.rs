use thiserror::Error;

/// Service-level errors surfaced across crate boundaries.
///
/// Subsystems keep their own error enums; this is the shape the
/// administrative facade hands back to callers.
#[derive(Debug, Error)]
pub enum HomeroomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid timezone identifier: {0}")]
    InvalidTimezone(String),

    #[error("Invalid deadline: {0}")]
    InvalidDeadline(String),

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    /// The assignment row was written but one or more reminder jobs could
    /// not be persisted. The caller should tell the user the assignment was
    /// saved and that reminders may be incomplete.
    #[error("assignment {assignment_id} saved, but reminders may be incomplete: {reason}")]
    RemindersIncomplete { assignment_id: i64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HomeroomError>;
