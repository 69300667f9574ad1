//! Event envelope sent to delivery targets.

use chrono::{DateTime, SecondsFormat, Utc};
use leaklock_state::OwnerId;
use serde::{Serialize, Serializer};

/// The body POSTed to every target of a single dispatch.
///
/// Serializes to the target-facing wire shape:
///
/// ```json
/// {"eventType": "...", "eventData": {...}, "timestamp": "2025-01-01T00:00:00.000Z", "userId": "..."}
/// ```
///
/// One envelope is built per dispatch and shared by all delivery tasks, so
/// every target sees the same timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Opaque caller payload, passed through untouched
    #[serde(rename = "eventData")]
    pub payload: serde_json::Value,
    #[serde(rename = "timestamp", serialize_with = "millis_utc")]
    pub emitted_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub owner: OwnerId,
}

impl Envelope {
    pub fn new(
        event_type: impl Into<String>,
        payload: serde_json::Value,
        owner: OwnerId,
        emitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            emitted_at,
            owner,
        }
    }

    /// ISO-8601 timestamp with millisecond precision and a `Z` suffix.
    pub fn timestamp(&self) -> String {
        self.emitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn millis_utc<S>(at: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Envelope {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
            + chrono::Duration::milliseconds(589);
        Envelope::new(
            "subscription.created",
            json!({"subscriptionId": "sub-1", "amount": 9.99}),
            OwnerId::parse("user-7").unwrap(),
            at,
        )
    }

    #[test]
    fn serializes_to_wire_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "eventType": "subscription.created",
                "eventData": {"subscriptionId": "sub-1", "amount": 9.99},
                "timestamp": "2025-03-14T09:26:53.589Z",
                "userId": "user-7",
            })
        );
    }

    #[test]
    fn timestamp_has_millis_and_z_suffix() {
        let env = sample();
        assert_eq!(env.timestamp(), "2025-03-14T09:26:53.589Z");
    }

    #[test]
    fn payload_is_passed_through_opaquely() {
        let mut env = sample();
        env.payload = json!([1, "two", null, {"nested": true}]);
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["eventData"], json!([1, "two", null, {"nested": true}]));
    }
}
