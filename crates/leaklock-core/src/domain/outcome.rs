//! Per-target delivery outcomes and the aggregated dispatch summary.

use serde::{Deserialize, Serialize};

/// Whether a single delivery attempt succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

/// Result of delivering one envelope to one target.
///
/// `failure_reason` is present exactly when `status` is `Failed`; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub target_name: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            status: DeliveryStatus::Success,
            failure_reason: None,
        }
    }

    pub fn failed(target_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            status: DeliveryStatus::Failed,
            failure_reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

/// Accounting for one dispatch, returned to the caller.
///
/// `succeeded + failed == total_targets == outcomes.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub total_targets: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// In registry resolution order
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchSummary {
    /// Summary for a dispatch that found no eligible targets.
    pub fn empty() -> Self {
        Self {
            total_targets: 0,
            succeeded: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    /// Message shown by request handlers alongside the summary.
    pub fn response_message(&self) -> &'static str {
        if self.total_targets == 0 {
            "No active webhooks found"
        } else {
            "Webhooks triggered"
        }
    }

    /// Outcomes that failed, in resolution order.
    pub fn failures(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_reason_only_on_failed() {
        let ok = DeliveryOutcome::success("Alerts");
        assert!(ok.is_success());
        assert!(ok.failure_reason.is_none());

        let bad = DeliveryOutcome::failed("Alerts", "timeout");
        assert!(!bad.is_success());
        assert_eq!(bad.failure_reason.as_deref(), Some("timeout"));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = DispatchSummary {
            total_targets: 2,
            succeeded: 1,
            failed: 1,
            outcomes: vec![
                DeliveryOutcome::success("A"),
                DeliveryOutcome::failed("B", "webhook B failed: 500 Internal Server Error"),
            ],
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "totalTargets": 2,
                "succeeded": 1,
                "failed": 1,
                "outcomes": [
                    {"targetName": "A", "status": "success"},
                    {
                        "targetName": "B",
                        "status": "failed",
                        "failureReason": "webhook B failed: 500 Internal Server Error"
                    }
                ]
            })
        );
    }

    #[test]
    fn response_message_depends_on_target_count() {
        assert_eq!(
            DispatchSummary::empty().response_message(),
            "No active webhooks found"
        );

        let summary = DispatchSummary {
            total_targets: 1,
            succeeded: 0,
            failed: 1,
            outcomes: vec![DeliveryOutcome::failed("A", "timeout")],
        };
        assert_eq!(summary.response_message(), "Webhooks triggered");
        assert_eq!(summary.failures().count(), 1);
    }
}
