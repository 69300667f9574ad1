//! Trait contract tests for TargetRegistry.
//!
//! These tests verify the behavioral contract of the registry trait using
//! the in-memory fake. Any conforming implementation must pass these.

use leaklock_state::fakes::{MemoryTargetRegistry, UnavailableTargetRegistry};
use leaklock_state::storage_traits::*;
use leaklock_state::StorageError;

fn owner(id: &str) -> OwnerId {
    OwnerId::parse(id).unwrap()
}

fn new_target(owner_id: &str, event_type: &str, name: &str) -> NewTarget {
    NewTarget::new(
        owner(owner_id),
        event_type,
        format!("https://hooks.example.com/{name}"),
        name,
    )
}

// ===========================================================================
// Resolution contract
// ===========================================================================

#[tokio::test]
async fn list_enabled_returns_only_exact_event_type_matches() {
    let registry = MemoryTargetRegistry::new();
    registry
        .register_target(new_target("u1", "subscription.created", "created"))
        .await
        .unwrap();
    registry
        .register_target(new_target("u1", "subscription.cancelled", "cancelled"))
        .await
        .unwrap();
    registry
        .register_target(new_target("u1", "subscription", "prefix"))
        .await
        .unwrap();

    let targets = registry
        .list_enabled_targets(&owner("u1"), "subscription.created")
        .await
        .unwrap();

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].display_name, "created");
}

#[tokio::test]
async fn list_enabled_excludes_disabled_targets() {
    let registry = MemoryTargetRegistry::new();
    registry
        .register_target(new_target("u1", "subscription.created", "on"))
        .await
        .unwrap();
    registry
        .register_target(new_target("u1", "subscription.created", "off").disabled())
        .await
        .unwrap();

    let targets = registry
        .list_enabled_targets(&owner("u1"), "subscription.created")
        .await
        .unwrap();

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].display_name, "on");
}

#[tokio::test]
async fn list_enabled_is_scoped_to_owner() {
    let registry = MemoryTargetRegistry::new();
    registry
        .register_target(new_target("u1", "subscription.created", "mine"))
        .await
        .unwrap();
    registry
        .register_target(new_target("u2", "subscription.created", "theirs"))
        .await
        .unwrap();

    let targets = registry
        .list_enabled_targets(&owner("u2"), "subscription.created")
        .await
        .unwrap();

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].display_name, "theirs");
}

#[tokio::test]
async fn list_enabled_empty_is_not_an_error() {
    let registry = MemoryTargetRegistry::new();
    let targets = registry
        .list_enabled_targets(&owner("u1"), "subscription.cancelled")
        .await
        .unwrap();

    assert!(targets.is_empty());
}

#[tokio::test]
async fn list_enabled_preserves_registration_order() {
    let registry = MemoryTargetRegistry::new();
    for name in ["first", "second", "third"] {
        registry
            .register_target(new_target("u1", "subscription.created", name))
            .await
            .unwrap();
    }

    let names: Vec<String> = registry
        .list_enabled_targets(&owner("u1"), "subscription.created")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.display_name)
        .collect();

    assert_eq!(names, vec!["first", "second", "third"]);
}

// ===========================================================================
// Management contract
// ===========================================================================

#[tokio::test]
async fn register_rejects_invalid_endpoint() {
    let registry = MemoryTargetRegistry::new();
    let bad = NewTarget::new(owner("u1"), "subscription.created", "not-a-url", "bad");

    let err = registry.register_target(bad).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidTarget { .. }));
}

#[tokio::test]
async fn set_enabled_toggles_eligibility() {
    let registry = MemoryTargetRegistry::new();
    let stored = registry
        .register_target(new_target("u1", "subscription.created", "toggle"))
        .await
        .unwrap();

    let updated = registry.set_enabled(&stored.id, false).await.unwrap();
    assert!(!updated.enabled);
    assert!(registry
        .list_enabled_targets(&owner("u1"), "subscription.created")
        .await
        .unwrap()
        .is_empty());

    registry.set_enabled(&stored.id, true).await.unwrap();
    assert_eq!(
        registry
            .list_enabled_targets(&owner("u1"), "subscription.created")
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn set_enabled_unknown_target_fails() {
    let registry = MemoryTargetRegistry::new();
    let err = registry
        .set_enabled(&TargetId::new(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::TargetNotFound { .. }));
}

#[tokio::test]
async fn remove_target_deletes_and_then_reports_missing() {
    let registry = MemoryTargetRegistry::new();
    let stored = registry
        .register_target(new_target("u1", "subscription.created", "gone"))
        .await
        .unwrap();

    registry.remove_target(&stored.id).await.unwrap();
    assert!(registry.list_targets(&owner("u1")).await.unwrap().is_empty());

    let err = registry.remove_target(&stored.id).await.unwrap_err();
    assert!(matches!(err, StorageError::TargetNotFound { .. }));
}

#[tokio::test]
async fn list_targets_includes_disabled() {
    let registry = MemoryTargetRegistry::new();
    registry
        .register_target(new_target("u1", "subscription.created", "on"))
        .await
        .unwrap();
    registry
        .register_target(new_target("u1", "subscription.renewed", "off").disabled())
        .await
        .unwrap();

    assert_eq!(registry.list_targets(&owner("u1")).await.unwrap().len(), 2);
}

// ===========================================================================
// Failure contract
// ===========================================================================

#[tokio::test]
async fn unavailable_registry_reports_backend_error() {
    let registry = UnavailableTargetRegistry::new("db offline");
    let err = registry
        .list_enabled_targets(&owner("u1"), "subscription.created")
        .await
        .unwrap_err();

    match err {
        StorageError::Backend(msg) => assert_eq!(msg, "db offline"),
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn memory_registry_counts_lookups() {
    let registry = MemoryTargetRegistry::new();
    assert_eq!(registry.lookup_count(), 0);
    registry
        .list_enabled_targets(&owner("u1"), "subscription.created")
        .await
        .unwrap();
    assert_eq!(registry.lookup_count(), 1);
}
