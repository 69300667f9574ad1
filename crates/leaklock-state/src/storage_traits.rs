//! Storage trait definitions for LeakLock
//!
//! `TargetRegistry` is the durable store of delivery targets. The dispatch
//! core only calls [`TargetRegistry::list_enabled_targets`]; the remaining
//! operations exist for account tooling and tests.
//!
//! The trait is async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Identity of the account that owns targets and receives notifications.
///
/// The inner string is private so an `OwnerId` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Validate and wrap an authenticated identity.
    pub fn parse(raw: impl Into<String>) -> StorageResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StorageError::InvalidOwner);
        }
        Ok(OwnerId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = StorageError;

    fn try_from(raw: String) -> StorageResult<Self> {
        OwnerId::parse(raw)
    }
}

impl From<OwnerId> for String {
    fn from(owner: OwnerId) -> String {
        owner.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a delivery target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    /// Generate a new random TargetId
    pub fn new() -> Self {
        TargetId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// DeliveryTarget
// ---------------------------------------------------------------------------

/// A registered automation endpoint.
///
/// A target is eligible for an event only when `enabled` is true and
/// `event_type` equals the dispatched event type exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub id: TargetId,
    pub owner: OwnerId,
    /// Event tag such as `"subscription.created"`
    pub event_type: String,
    /// URI the envelope is POSTed to
    pub endpoint: String,
    pub enabled: bool,
    /// Human label, used only for reporting
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl DeliveryTarget {
    /// Whether this target should receive an event of `event_type` for `owner`.
    pub fn is_eligible(&self, owner: &OwnerId, event_type: &str) -> bool {
        self.enabled && self.owner == *owner && self.event_type == event_type
    }
}

/// Request to register a new target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTarget {
    pub owner: OwnerId,
    pub event_type: String,
    pub endpoint: String,
    pub display_name: String,
    pub enabled: bool,
}

impl NewTarget {
    /// Build an enabled target registration.
    pub fn new(
        owner: OwnerId,
        event_type: impl Into<String>,
        endpoint: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            owner,
            event_type: event_type.into(),
            endpoint: endpoint.into(),
            display_name: display_name.into(),
            enabled: true,
        }
    }

    /// Register the target in the disabled state.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Check the registration before it is stored.
    pub fn validate(&self) -> StorageResult<()> {
        if self.event_type.trim().is_empty() {
            return Err(StorageError::InvalidTarget {
                reason: "event type must not be empty".to_string(),
            });
        }
        if self.display_name.trim().is_empty() {
            return Err(StorageError::InvalidTarget {
                reason: "display name must not be empty".to_string(),
            });
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(StorageError::InvalidTarget {
                reason: format!("endpoint must be an http(s) URL: {}", self.endpoint),
            });
        }
        Ok(())
    }

    /// Materialize the registration into a stored target.
    pub fn into_target(self) -> DeliveryTarget {
        DeliveryTarget {
            id: TargetId::new(),
            owner: self.owner,
            event_type: self.event_type,
            endpoint: self.endpoint,
            enabled: self.enabled,
            display_name: self.display_name,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// TargetRegistry
// ---------------------------------------------------------------------------

/// Delivery target registry.
///
/// Guarantees:
/// - `list_enabled_targets` returns only enabled targets whose owner and
///   event type match exactly, in registration order.
/// - An empty result is not an error.
/// - Infrastructure failures surface as `StorageError::Backend`.
#[async_trait]
pub trait TargetRegistry: Send + Sync {
    /// Resolve the active target set for one event.
    async fn list_enabled_targets(
        &self,
        owner: &OwnerId,
        event_type: &str,
    ) -> StorageResult<Vec<DeliveryTarget>>;

    /// List every target of an owner, enabled or not, in registration order.
    async fn list_targets(&self, owner: &OwnerId) -> StorageResult<Vec<DeliveryTarget>>;

    /// Validate and store a new target.
    async fn register_target(&self, target: NewTarget) -> StorageResult<DeliveryTarget>;

    /// Enable or disable a target. Fails with `TargetNotFound` if absent.
    async fn set_enabled(&self, id: &TargetId, enabled: bool) -> StorageResult<DeliveryTarget>;

    /// Delete a target. Fails with `TargetNotFound` if absent.
    async fn remove_target(&self, id: &TargetId) -> StorageResult<()>;
}
