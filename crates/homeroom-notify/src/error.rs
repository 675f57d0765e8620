use thiserror::Error;

/// Errors within the notification subsystem.
///
/// Per-recipient send failures never leave the notifier — they become
/// entries in the delivery report. What can propagate is an infrastructure
/// failure (the store itself), and even that is only logged by the
/// delivery task.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("gateway send failed: {0}")]
    Send(String),

    #[error("delivery timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("store error: {0}")]
    Store(#[from] homeroom_store::StoreError),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
