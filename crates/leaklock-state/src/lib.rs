//! LeakLock State: SurrealDB Backend for Delivery Targets
//!
//! This crate provides the persistence layer for LeakLock's notification
//! fan-out. It owns the delivery target registry: which automation
//! endpoints an account has registered, for which event type, and whether
//! they are currently enabled.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: exact-match lookups of enabled targets and simple target CRUD.
//!
//! ## Key Components
//!
//! - `SurrealHandle`: Manages connection and schema setup
//! - `TargetRegistry`: Backend-agnostic registry trait
//! - `SurrealTargetRegistry`: SurrealDB-backed registry
//! - `fakes`: In-memory registries for tests

mod error;
pub mod fakes;
mod handle;
mod schema;
pub mod storage_traits;
mod surreal_registry;

pub use error::{StateError, StorageError};
pub use handle::{CloudConfig, CloudCredentials, DbLocation, SurrealHandle};
pub use schema::TargetRecord;
pub use storage_traits::{
    DeliveryTarget, NewTarget, OwnerId, StorageResult, TargetId, TargetRegistry,
};
pub use surreal_registry::SurrealTargetRegistry;

/// Result type for leaklock-state operations
pub type Result<T> = std::result::Result<T, StateError>;
