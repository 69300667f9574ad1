//! Result aggregation for a fan-out.

use leaklock_state::DeliveryTarget;

use crate::domain::{DeliveryOutcome, DispatchSummary};

/// Reason used for a target whose attempt produced no outcome at all.
pub const MISSING_OUTCOME_REASON: &str = "no outcome recorded";

/// Fold per-target outcomes into a summary.
///
/// `outcomes` is positional: the i-th outcome belongs to the i-th target.
/// Order is preserved verbatim. A target without an outcome is reported
/// as failed so the counts always add up.
pub fn aggregate(targets: &[DeliveryTarget], outcomes: Vec<DeliveryOutcome>) -> DispatchSummary {
    aggregate_slots(targets, outcomes.into_iter().map(Some).collect())
}

/// Like [`aggregate`], for index-addressed slots that may be empty.
pub fn aggregate_slots(
    targets: &[DeliveryTarget],
    slots: Vec<Option<DeliveryOutcome>>,
) -> DispatchSummary {
    let mut slots = slots.into_iter();
    let mut summary = DispatchSummary {
        total_targets: targets.len(),
        succeeded: 0,
        failed: 0,
        outcomes: Vec::with_capacity(targets.len()),
    };

    for target in targets {
        let outcome = slots.next().flatten().unwrap_or_else(|| {
            DeliveryOutcome::failed(&target.display_name, MISSING_OUTCOME_REASON)
        });

        if outcome.is_success() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        summary.outcomes.push(outcome);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaklock_state::{NewTarget, OwnerId};

    fn targets(names: &[&str]) -> Vec<DeliveryTarget> {
        let owner = OwnerId::parse("user-1").unwrap();
        names
            .iter()
            .map(|name| {
                NewTarget::new(
                    owner.clone(),
                    "subscription.created",
                    format!("https://hooks.test/{name}"),
                    *name,
                )
                .into_target()
            })
            .collect()
    }

    #[test]
    fn mixed_outcomes_are_counted_in_order() {
        let targets = targets(&["A", "B", "C"]);
        let summary = aggregate(
            &targets,
            vec![
                DeliveryOutcome::success("A"),
                DeliveryOutcome::failed("B", "webhook B failed: 500 Internal Server Error"),
                DeliveryOutcome::success("C"),
            ],
        );

        assert_eq!(summary.total_targets, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        let names: Vec<_> = summary.outcomes.iter().map(|o| o.target_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn all_failed_is_still_a_summary() {
        let targets = targets(&["A", "B"]);
        let summary = aggregate(
            &targets,
            vec![
                DeliveryOutcome::failed("A", "timeout"),
                DeliveryOutcome::failed("B", "timeout"),
            ],
        );
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 2);
    }

    #[test]
    fn empty_input_is_empty_summary() {
        assert_eq!(aggregate(&[], Vec::new()), DispatchSummary::empty());
    }

    #[test]
    fn missing_outcomes_count_as_failures() {
        let targets = targets(&["A", "B", "C"]);
        let summary = aggregate_slots(
            &targets,
            vec![Some(DeliveryOutcome::success("A")), None],
        );

        assert_eq!(summary.total_targets, 3);
        assert_eq!(summary.succeeded + summary.failed, summary.total_targets);
        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.outcomes[1].target_name, "B");
        assert_eq!(
            summary.outcomes[2].failure_reason.as_deref(),
            Some(MISSING_OUTCOME_REASON)
        );
    }
}
