//! Event fan-out.
//!
//! A dispatch resolves the owner's enabled targets for one event type,
//! POSTs a shared envelope to all of them concurrently, waits for every
//! attempt and returns a [`DispatchSummary`]. One failing target never
//! stops the others.
//!
//! ```ignore
//! let dispatcher = Dispatcher::new(registry, Arc::new(HttpDeliverer::with_defaults()?));
//! let summary = dispatcher
//!     .dispatch(&owner, "subscription.created", json!({"subscriptionId": "sub-1"}))
//!     .await?;
//! ```

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use leaklock_state::{DeliveryTarget, OwnerId, TargetRegistry};
use tokio::task::JoinSet;
use tracing::{debug, warn, Instrument};

use crate::aggregator::aggregate_slots;
use crate::auth::{bearer_token, Authenticator};
use crate::clock::{Clock, SystemClock};
use crate::delivery::Deliverer;
use crate::domain::{DeliveryOutcome, DispatchError, DispatchSummary, Envelope};
use crate::metrics::METRICS;
use crate::obs;

/// Lifecycle of a single dispatch.
///
/// `Resolving -> Delivering -> Aggregated`, or terminates in `Resolving`
/// with an error when the registry lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Resolving,
    Delivering,
    Aggregated,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchPhase::Resolving => "resolving",
            DispatchPhase::Delivering => "delivering",
            DispatchPhase::Aggregated => "aggregated",
        };
        f.write_str(s)
    }
}

/// Fans events out to registered delivery targets.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<dyn TargetRegistry>,
    deliverer: Arc<dyn Deliverer>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(registry: Arc<dyn TargetRegistry>, deliverer: Arc<dyn Deliverer>) -> Self {
        Self {
            registry,
            deliverer,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp envelopes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Deliver `payload` to every enabled target `owner` registered for
    /// `event_type`.
    ///
    /// # Errors
    ///
    /// - `InvalidEventType` if `event_type` is blank (registry not consulted)
    /// - `RegistryUnavailable` if target lookup fails (nothing delivered)
    ///
    /// Failed deliveries are reported inside the summary, not as errors.
    pub async fn dispatch(
        &self,
        owner: &OwnerId,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<DispatchSummary, DispatchError> {
        if event_type.trim().is_empty() {
            let err = DispatchError::InvalidEventType;
            obs::emit_dispatch_rejected(event_type, &err);
            return Err(err);
        }

        let dispatch_id = uuid::Uuid::new_v4().to_string();
        let span = obs::dispatch_span(&dispatch_id, owner, event_type);
        self.run(owner, event_type, payload).instrument(span).await
    }

    /// Resolve the owner from a bearer credential, then [`dispatch`](Self::dispatch).
    ///
    /// Fails with `Unauthorized` before touching the registry when the
    /// credential is missing or rejected.
    pub async fn dispatch_authenticated(
        &self,
        authenticator: &dyn Authenticator,
        bearer: Option<&str>,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<DispatchSummary, DispatchError> {
        let Some(token) = bearer.and_then(bearer_token) else {
            let err = DispatchError::Unauthorized("missing bearer token".to_string());
            obs::emit_dispatch_rejected(event_type, &err);
            return Err(err);
        };

        let owner = match authenticator.authenticate(token).await {
            Ok(owner) => owner,
            Err(err) => {
                obs::emit_dispatch_rejected(event_type, &err);
                return Err(err);
            }
        };

        self.dispatch(&owner, event_type, payload).await
    }

    async fn run(
        &self,
        owner: &OwnerId,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<DispatchSummary, DispatchError> {
        let started = Instant::now();
        METRICS.inc_dispatches();
        obs::emit_dispatch_started(owner, event_type);

        let mut targets = match self.registry.list_enabled_targets(owner, event_type).await {
            Ok(targets) => targets,
            Err(e) => {
                METRICS.inc_registry_failures();
                let err = DispatchError::RegistryUnavailable(e.to_string());
                obs::emit_dispatch_rejected(event_type, &err);
                return Err(err);
            }
        };

        let resolved = targets.len();
        targets.retain(|t| t.is_eligible(owner, event_type));
        if targets.len() != resolved {
            warn!(
                dropped = resolved - targets.len(),
                "registry returned ineligible targets"
            );
        }
        obs::emit_targets_resolved(targets.len());

        if targets.is_empty() {
            let summary = DispatchSummary::empty();
            obs::emit_dispatch_completed(&summary, started.elapsed().as_millis() as u64);
            return Ok(summary);
        }

        let envelope = Arc::new(Envelope::new(
            event_type,
            payload,
            owner.clone(),
            self.clock.now(),
        ));

        let slots = self.deliver_all(&targets, envelope).await;
        let summary = aggregate_slots(&targets, slots);

        obs::emit_dispatch_completed(&summary, started.elapsed().as_millis() as u64);
        Ok(summary)
    }

    /// One task per target; results land in the slot matching the target's
    /// position so completion order does not matter.
    async fn deliver_all(
        &self,
        targets: &[DeliveryTarget],
        envelope: Arc<Envelope>,
    ) -> Vec<Option<DeliveryOutcome>> {
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().cloned().enumerate() {
            let deliverer = Arc::clone(&self.deliverer);
            let envelope = Arc::clone(&envelope);

            tasks.spawn(
                async move {
                    let outcome = AssertUnwindSafe(deliverer.deliver(&target, &envelope))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            DeliveryOutcome::failed(
                                &target.display_name,
                                format!("delivery task aborted: {}", panic_message(&*panic)),
                            )
                        });
                    (index, outcome)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<DeliveryOutcome>> = vec![None; targets.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    obs::emit_delivery_finished(&outcome);
                    METRICS.record_delivery(outcome.is_success());
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => warn!(error = %e, "delivery task did not complete"),
            }
        }

        debug!(
            recorded = slots.iter().filter(|s| s.is_some()).count(),
            "fan-out joined"
        );
        slots
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use leaklock_state::fakes::{MemoryTargetRegistry, UnavailableTargetRegistry};
    use leaklock_state::NewTarget;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every envelope and answers from a name -> outcome script.
    #[derive(Default)]
    struct ScriptedDeliverer {
        seen: Mutex<Vec<(String, Envelope)>>,
        fail: Vec<&'static str>,
        panic_on: Vec<&'static str>,
    }

    #[async_trait]
    impl Deliverer for ScriptedDeliverer {
        async fn deliver(&self, target: &DeliveryTarget, envelope: &Envelope) -> DeliveryOutcome {
            self.seen
                .lock()
                .unwrap()
                .push((target.display_name.clone(), envelope.clone()));
            if self.panic_on.contains(&target.display_name.as_str()) {
                panic!("deliverer exploded");
            }
            if self.fail.contains(&target.display_name.as_str()) {
                DeliveryOutcome::failed(&target.display_name, "scripted failure")
            } else {
                DeliveryOutcome::success(&target.display_name)
            }
        }
    }

    fn owner() -> OwnerId {
        OwnerId::parse("user-1").unwrap()
    }

    async fn registry_with(names: &[&str]) -> Arc<MemoryTargetRegistry> {
        let registry = Arc::new(MemoryTargetRegistry::new());
        for name in names {
            registry
                .register_target(NewTarget::new(
                    owner(),
                    "subscription.created",
                    format!("https://hooks.test/{name}"),
                    *name,
                ))
                .await
                .unwrap();
        }
        registry
    }

    #[test]
    fn phase_display() {
        assert_eq!(DispatchPhase::Resolving.to_string(), "resolving");
        assert_eq!(DispatchPhase::Delivering.to_string(), "delivering");
        assert_eq!(DispatchPhase::Aggregated.to_string(), "aggregated");
    }

    #[tokio::test]
    async fn empty_event_type_is_rejected_before_lookup() {
        let registry = registry_with(&["A"]).await;
        let deliverer = Arc::new(ScriptedDeliverer::default());
        let dispatcher = Dispatcher::new(registry.clone(), deliverer.clone());

        let err = dispatcher.dispatch(&owner(), "  ", json!({})).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidEventType));
        assert_eq!(registry.lookup_count(), 0);
        assert!(deliverer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registry_failure_makes_no_attempts() {
        let deliverer = Arc::new(ScriptedDeliverer::default());
        let dispatcher = Dispatcher::new(
            Arc::new(UnavailableTargetRegistry::default()),
            deliverer.clone(),
        );

        let err = dispatcher
            .dispatch(&owner(), "subscription.created", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::RegistryUnavailable(_)));
        assert!(deliverer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_do_not_stop_other_targets() {
        let registry = registry_with(&["A", "B", "C"]).await;
        let deliverer = Arc::new(ScriptedDeliverer {
            fail: vec!["B"],
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(registry, deliverer.clone());

        let summary = dispatcher
            .dispatch(&owner(), "subscription.created", json!({"id": 1}))
            .await
            .unwrap();

        assert_eq!(summary.total_targets, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.outcomes[1].target_name, "B");
        assert_eq!(deliverer.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn panicking_delivery_becomes_failed_outcome() {
        let registry = registry_with(&["A", "Boom", "C"]).await;
        let deliverer = Arc::new(ScriptedDeliverer {
            panic_on: vec!["Boom"],
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(registry, deliverer);

        let summary = dispatcher
            .dispatch(&owner(), "subscription.created", json!({}))
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        let boom = &summary.outcomes[1];
        assert_eq!(boom.target_name, "Boom");
        let reason = boom.failure_reason.as_deref().unwrap();
        assert!(reason.starts_with("delivery task aborted"));
        assert!(reason.contains("deliverer exploded"));
    }

    #[tokio::test]
    async fn all_targets_share_one_envelope() {
        let registry = registry_with(&["A", "B", "C", "D"]).await;
        let deliverer = Arc::new(ScriptedDeliverer::default());
        let dispatcher = Dispatcher::new(registry, deliverer.clone());

        dispatcher
            .dispatch(&owner(), "subscription.created", json!({"k": "v"}))
            .await
            .unwrap();

        let seen = deliverer.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        let first = &seen[0].1;
        assert!(seen.iter().all(|(_, env)| env == first));
        assert_eq!(first.payload, json!({"k": "v"}));
        assert_eq!(first.owner, owner());
    }

    #[test]
    fn panic_message_extracts_strings() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(&*boxed), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*boxed), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
