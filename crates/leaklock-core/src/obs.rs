//! Structured observability hooks for the dispatch lifecycle.
//!
//! Each dispatch runs inside a `leaklock.dispatch` span (see
//! [`dispatch_span`]) and emits one event per phase transition:
//! started (resolving), targets resolved (delivering), one event per
//! delivery, completed (aggregated). Rejections are logged at `warn!`.
//!
//! Verbosity follows `RUST_LOG`; pass `--json` to the CLI for JSON lines.

use leaklock_state::OwnerId;
use tracing::{info, warn, Span};

use crate::dispatcher::DispatchPhase;
use crate::domain::{DeliveryOutcome, DispatchSummary};

/// Span covering one dispatch from resolution to aggregation.
///
/// Attach it with `tracing::Instrument` so it follows the future across
/// await points.
pub fn dispatch_span(dispatch_id: &str, owner: &OwnerId, event_type: &str) -> Span {
    tracing::info_span!(
        "leaklock.dispatch",
        dispatch_id = %dispatch_id,
        owner = %owner,
        event_type = %event_type,
    )
}

/// Emit event: dispatch accepted, resolving targets.
///
/// ```ignore
/// emit_dispatch_started(&owner, "subscription.created");
/// // logs: event=dispatch.started phase=resolving owner=u1 event_type=subscription.created
/// ```
pub fn emit_dispatch_started(owner: &OwnerId, event_type: &str) {
    info!(
        event = "dispatch.started",
        phase = %DispatchPhase::Resolving,
        owner = %owner,
        event_type = %event_type,
    );
}

/// Emit event: target set resolved, fan-out about to begin.
pub fn emit_targets_resolved(target_count: usize) {
    info!(
        event = "dispatch.targets_resolved",
        phase = %DispatchPhase::Delivering,
        target_count = target_count,
    );
}

/// Emit event: one delivery attempt finished.
pub fn emit_delivery_finished(outcome: &DeliveryOutcome) {
    match &outcome.failure_reason {
        None => info!(
            event = "delivery.finished",
            target_name = %outcome.target_name,
            success = true,
        ),
        Some(reason) => warn!(
            event = "delivery.finished",
            target_name = %outcome.target_name,
            success = false,
            reason = %reason,
        ),
    }
}

/// Emit event: summary built.
pub fn emit_dispatch_completed(summary: &DispatchSummary, duration_ms: u64) {
    info!(
        event = "dispatch.completed",
        phase = %DispatchPhase::Aggregated,
        total_targets = summary.total_targets,
        succeeded = summary.succeeded,
        failed = summary.failed,
        duration_ms = duration_ms,
    );
}

/// Emit event: dispatch refused before any delivery (warning level).
pub fn emit_dispatch_rejected(event_type: &str, error: &dyn std::fmt::Display) {
    warn!(event = "dispatch.rejected", event_type = %event_type, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_span_create() {
        let owner = OwnerId::parse("u1").unwrap();
        let span = dispatch_span("d-1", &owner, "subscription.created");
        let _entered = span.enter();
    }
}
