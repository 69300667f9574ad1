//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryTargetRegistry`, which satisfies the `TargetRegistry`
//! contract without any external dependencies, and
//! `UnavailableTargetRegistry`, which fails every call the way an
//! unreachable database would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryTargetRegistry
// ---------------------------------------------------------------------------

/// In-memory registry backed by a `Vec<DeliveryTarget>` in insertion order.
#[derive(Debug, Default)]
pub struct MemoryTargetRegistry {
    targets: Mutex<Vec<DeliveryTarget>>,
    lookups: AtomicUsize,
}

impl MemoryTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `list_enabled_targets` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetRegistry for MemoryTargetRegistry {
    async fn list_enabled_targets(
        &self,
        owner: &OwnerId,
        event_type: &str,
    ) -> StorageResult<Vec<DeliveryTarget>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let targets = self.targets.lock().unwrap();
        Ok(targets
            .iter()
            .filter(|t| t.is_eligible(owner, event_type))
            .cloned()
            .collect())
    }

    async fn list_targets(&self, owner: &OwnerId) -> StorageResult<Vec<DeliveryTarget>> {
        let targets = self.targets.lock().unwrap();
        Ok(targets
            .iter()
            .filter(|t| t.owner == *owner)
            .cloned()
            .collect())
    }

    async fn register_target(&self, target: NewTarget) -> StorageResult<DeliveryTarget> {
        target.validate()?;
        let stored = target.into_target();
        let mut targets = self.targets.lock().unwrap();
        targets.push(stored.clone());
        Ok(stored)
    }

    async fn set_enabled(&self, id: &TargetId, enabled: bool) -> StorageResult<DeliveryTarget> {
        let mut targets = self.targets.lock().unwrap();
        let target = targets
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| StorageError::TargetNotFound {
                target_id: id.0.clone(),
            })?;
        target.enabled = enabled;
        Ok(target.clone())
    }

    async fn remove_target(&self, id: &TargetId) -> StorageResult<()> {
        let mut targets = self.targets.lock().unwrap();
        let before = targets.len();
        targets.retain(|t| t.id != *id);
        if targets.len() == before {
            return Err(StorageError::TargetNotFound {
                target_id: id.0.clone(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UnavailableTargetRegistry
// ---------------------------------------------------------------------------

/// Registry whose backend is down: every call returns `StorageError::Backend`.
#[derive(Debug)]
pub struct UnavailableTargetRegistry {
    reason: String,
}

impl UnavailableTargetRegistry {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> StorageResult<T> {
        Err(StorageError::Backend(self.reason.clone()))
    }
}

impl Default for UnavailableTargetRegistry {
    fn default() -> Self {
        Self::new("connection refused")
    }
}

#[async_trait]
impl TargetRegistry for UnavailableTargetRegistry {
    async fn list_enabled_targets(
        &self,
        _owner: &OwnerId,
        _event_type: &str,
    ) -> StorageResult<Vec<DeliveryTarget>> {
        self.fail()
    }

    async fn list_targets(&self, _owner: &OwnerId) -> StorageResult<Vec<DeliveryTarget>> {
        self.fail()
    }

    async fn register_target(&self, _target: NewTarget) -> StorageResult<DeliveryTarget> {
        self.fail()
    }

    async fn set_enabled(&self, _id: &TargetId, _enabled: bool) -> StorageResult<DeliveryTarget> {
        self.fail()
    }

    async fn remove_target(&self, _id: &TargetId) -> StorageResult<()> {
        self.fail()
    }
}
