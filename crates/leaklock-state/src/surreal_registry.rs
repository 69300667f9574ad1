use std::sync::Arc;

use async_trait::async_trait;

use crate::storage_traits::{
    DeliveryTarget, NewTarget, OwnerId, StorageResult, TargetId, TargetRegistry,
};
use crate::SurrealHandle;

/// SurrealDB-backed implementation of the TargetRegistry trait.
#[derive(Clone)]
pub struct SurrealTargetRegistry {
    handle: Arc<SurrealHandle>,
}

impl SurrealTargetRegistry {
    pub fn new(handle: Arc<SurrealHandle>) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl TargetRegistry for SurrealTargetRegistry {
    async fn list_enabled_targets(
        &self,
        owner: &OwnerId,
        event_type: &str,
    ) -> StorageResult<Vec<DeliveryTarget>> {
        self.handle.select_enabled_targets(owner, event_type).await
    }

    async fn list_targets(&self, owner: &OwnerId) -> StorageResult<Vec<DeliveryTarget>> {
        self.handle.select_owner_targets(owner).await
    }

    async fn register_target(&self, target: NewTarget) -> StorageResult<DeliveryTarget> {
        target.validate()?;
        self.handle.insert_target(&target.into_target()).await
    }

    async fn set_enabled(&self, id: &TargetId, enabled: bool) -> StorageResult<DeliveryTarget> {
        self.handle.update_target_enabled(id, enabled).await
    }

    async fn remove_target(&self, id: &TargetId) -> StorageResult<()> {
        self.handle.delete_target(id).await
    }
}
