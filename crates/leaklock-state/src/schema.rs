//! Schema definitions for LeakLock SurrealDB tables
//!
//! Tables:
//! - delivery_targets: automation endpoints keyed by owner and event type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::{DeliveryTarget, OwnerId, TargetId};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Row stored in the `delivery_targets` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRecord {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Stable target ID (UUID string)
    pub target_id: String,
    /// Owning account
    pub owner: String,
    /// Exact event tag this target listens to
    pub event_type: String,
    /// Delivery URI
    pub endpoint: String,
    /// Whether the target currently receives events
    pub enabled: bool,
    /// Label used in dispatch reports
    pub display_name: String,
    /// Registration timestamp
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl TargetRecord {
    /// Build a row from a domain target
    pub fn from_target(target: &DeliveryTarget) -> Self {
        TargetRecord {
            id: None,
            target_id: target.id.0.clone(),
            owner: target.owner.as_str().to_string(),
            event_type: target.event_type.clone(),
            endpoint: target.endpoint.clone(),
            enabled: target.enabled,
            display_name: target.display_name.clone(),
            created_at: target.created_at,
        }
    }

    /// Convert a row back into a domain target.
    ///
    /// Returns `None` when the stored owner is blank, which only happens if
    /// the row was written outside this crate.
    pub fn into_target(self) -> Option<DeliveryTarget> {
        let owner = OwnerId::parse(self.owner).ok()?;
        Some(DeliveryTarget {
            id: TargetId(self.target_id),
            owner,
            event_type: self.event_type,
            endpoint: self.endpoint,
            enabled: self.enabled,
            display_name: self.display_name,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_traits::NewTarget;

    #[test]
    fn record_round_trips_domain_target() {
        let owner = OwnerId::parse("user-1").unwrap();
        let target =
            NewTarget::new(owner, "subscription.created", "https://hooks.test/a", "A").into_target();

        let back = TargetRecord::from_target(&target).into_target().unwrap();
        assert_eq!(back, target);
    }

    #[test]
    fn record_with_blank_owner_is_skipped() {
        let owner = OwnerId::parse("user-1").unwrap();
        let target =
            NewTarget::new(owner, "subscription.created", "https://hooks.test/a", "A").into_target();
        let mut record = TargetRecord::from_target(&target);
        record.owner = " ".to_string();

        assert!(record.into_target().is_none());
    }
}
