use thiserror::Error;

/// Errors that can occur within the scheduling subsystem.
///
/// A vanished assignment or group is deliberately *not* an error — that is
/// a benign race with deletion and scheduling no-ops. What does surface is
/// a persistence failure: an unpersisted, unarmed reminder would silently
/// never fire, so the caller must hear about it.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("store error: {0}")]
    Store(#[from] homeroom_store::StoreError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
