use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// A single call record as delivered by the event source
///
/// Every field except `id` may be missing, null, or of the wrong type; such a
/// field reads as absent and each computation skips the events that lack the
/// field it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Call identifier
    pub id: String,

    /// When the call started
    #[serde(default, deserialize_with = "lenient")]
    pub start_timestamp: Option<DateTime<Utc>>,

    /// Call length in whole seconds
    #[serde(default, deserialize_with = "lenient")]
    pub duration_secs: Option<i64>,

    /// Free-text outcome evaluation
    #[serde(default, deserialize_with = "lenient")]
    pub evaluation: Option<String>,

    /// Why the call ended
    #[serde(default, deserialize_with = "lenient")]
    pub disconnection_reason: Option<String>,

    /// Final call status
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,

    /// Inbound or outbound
    #[serde(default, deserialize_with = "lenient_direction")]
    pub direction: CallDirection,

    /// Caller identity, used for unique-caller counts
    #[serde(default, deserialize_with = "lenient")]
    pub from_number: Option<String>,
}

impl CallEvent {
    /// Create an event with only an id and start time
    pub fn new(id: impl Into<String>, start_timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start_timestamp: Some(start_timestamp),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, secs: i64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn with_evaluation(mut self, evaluation: impl Into<String>) -> Self {
        self.evaluation = Some(evaluation.into());
        self
    }

    pub fn with_disconnection_reason(mut self, reason: impl Into<String>) -> Self {
        self.disconnection_reason = Some(reason.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_direction(mut self, direction: CallDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_from_number(mut self, from_number: impl Into<String>) -> Self {
        self.from_number = Some(from_number.into());
        self
    }

    /// Duration in seconds, with a missing value read as zero
    pub fn duration_or_zero(&self) -> i64 {
        self.duration_secs.unwrap_or(0)
    }
}

/// Read a field, treating null or a value of the wrong shape as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_direction<'de, D>(deserializer: D) -> Result<CallDirection, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, CallDirection>(deserializer)?.unwrap_or_default())
}

/// Direction of a call
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum CallDirection {
    Inbound,
    Outbound,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CallDirection {
    /// Presentation label
    pub fn label(&self) -> &'static str {
        match self {
            CallDirection::Inbound => "Inbound",
            CallDirection::Outbound => "Outbound",
            CallDirection::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_direction_deserializes_unrecognised_as_unknown() {
        let event: CallEvent =
            serde_json::from_str(r#"{"id":"c1","direction":"sideways"}"#).unwrap();
        assert_eq!(event.direction, CallDirection::Unknown);

        let event: CallEvent =
            serde_json::from_str(r#"{"id":"c2","direction":"inbound"}"#).unwrap();
        assert_eq!(event.direction, CallDirection::Inbound);
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let event: CallEvent = serde_json::from_str(r#"{"id":"c3"}"#).unwrap();
        assert!(event.start_timestamp.is_none());
        assert_eq!(event.duration_or_zero(), 0);
        assert_eq!(event.direction, CallDirection::Unknown);
    }

    #[test]
    fn test_null_direction_reads_as_unknown() {
        let event: CallEvent =
            serde_json::from_str(r#"{"id":"c4","direction":null,"duration_secs":65}"#).unwrap();
        assert_eq!(event.direction, CallDirection::Unknown);
        assert_eq!(event.duration_secs, Some(65));

        let event: CallEvent = serde_json::from_str(r#"{"id":"c5","direction":7}"#).unwrap();
        assert_eq!(event.direction, CallDirection::Unknown);
    }

    #[test]
    fn test_mistyped_fields_read_as_absent() {
        let event: CallEvent = serde_json::from_str(
            r#"{
                "id": "c6",
                "start_timestamp": "yesterday",
                "duration_secs": "long",
                "evaluation": null,
                "status": 3,
                "from_number": ["+1555"]
            }"#,
        )
        .unwrap();

        assert!(event.start_timestamp.is_none());
        assert!(event.duration_secs.is_none());
        assert!(event.evaluation.is_none());
        assert!(event.status.is_none());
        assert!(event.from_number.is_none());
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!(CallDirection::from_str("OUTBOUND").unwrap(), CallDirection::Outbound);
        assert_eq!(CallDirection::Inbound.to_string(), "Inbound");
    }
}
