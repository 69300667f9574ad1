//! Domain-level error taxonomy for LeakLock.

use leaklock_state::StorageError;

/// Errors that prevent a dispatch from producing a summary.
///
/// Individual delivery failures are never represented here; they are
/// reported as failed outcomes inside the summary.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("event type must not be empty")]
    InvalidEventType,

    #[error("target registry unavailable: {0}")]
    RegistryUnavailable(String),
}

/// General LeakLock errors outside the dispatch path.
#[derive(Debug, thiserror::Error)]
pub enum LeakLockError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http client error: {0}")]
    HttpClient(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no subscription templates available")]
    NoTemplates,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for LeakLock operations.
pub type Result<T> = std::result::Result<T, LeakLockError>;
