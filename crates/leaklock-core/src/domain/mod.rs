//! Domain model for LeakLock dispatch.
//!
//! - `Envelope`: the event body delivered to every target of one fan-out
//! - `DeliveryOutcome`: result of one delivery attempt
//! - `DispatchSummary`: aggregated accounting returned to the caller

pub mod envelope;
pub mod error;
pub mod outcome;

pub use envelope::Envelope;
pub use error::{DispatchError, LeakLockError, Result};
pub use outcome::{DeliveryOutcome, DeliveryStatus, DispatchSummary};
