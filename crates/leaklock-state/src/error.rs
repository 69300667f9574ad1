//! Error types for leaklock-state

use thiserror::Error;

/// Errors that can occur while connecting to or preparing the database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Errors returned by [`crate::TargetRegistry`] implementations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store could not serve the request (infrastructure failure)
    #[error("registry backend error: {0}")]
    Backend(String),

    /// No target with the given id exists
    #[error("delivery target not found: {target_id}")]
    TargetNotFound { target_id: String },

    /// A target failed validation before it was stored
    #[error("invalid delivery target: {reason}")]
    InvalidTarget { reason: String },

    /// An owner identity was empty or malformed
    #[error("invalid owner identity")]
    InvalidOwner,
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}
