use crate::core::duration;
use crate::core::error::MaintenanceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceState {
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl MaintenanceState {
    /// The state assumed when nothing trustworthy is known.
    pub fn inactive() -> Self {
        Self {
            is_active: false,
            message: None,
            estimated_duration: None,
            activated_by: None,
            activated_at: None,
        }
    }

    /// Parses a server payload, rejecting it unless `isActive` is a boolean.
    /// Optional fields that fail to parse are dropped.
    pub fn from_value(value: Value) -> Result<Self, MaintenanceError> {
        let Some(is_active) = value.get("isActive").and_then(Value::as_bool) else {
            return Err(MaintenanceError::Validation(
                "response field isActive is missing or not a boolean".to_string(),
            ));
        };

        Ok(Self {
            is_active,
            message: text_field(&value, "message"),
            estimated_duration: minutes_field(&value, "estimatedDuration"),
            activated_by: text_field(&value, "activatedBy"),
            activated_at: timestamp_field(&value, "activatedAt"),
        })
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        duration::compute_end_time(self.activated_at, self.estimated_duration)
    }

    pub fn is_overdue(&self) -> bool {
        duration::is_overdue(self.activated_at, self.estimated_duration)
    }

    pub fn remaining_minutes(&self) -> Option<i64> {
        duration::remaining_minutes(self.activated_at, self.estimated_duration)
    }

    pub fn duration_label(&self) -> String {
        duration::format_duration(self.estimated_duration)
    }
}

impl Default for MaintenanceState {
    fn default() -> Self {
        Self::inactive()
    }
}

fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    let raw = present(value, key)?;
    let text = raw.as_str().map(str::to_string);
    if text.is_none() {
        tracing::debug!(field = key, value = %raw, "Ignoring non-string status field");
    }
    text
}

/// Any JSON number is accepted and rounded to whole minutes.
fn minutes_field(value: &Value, key: &str) -> Option<i64> {
    let raw = present(value, key)?;
    let minutes = raw.as_i64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.round() as i64)
    });
    if minutes.is_none() {
        tracing::debug!(field = key, value = %raw, "Ignoring non-numeric status field");
    }
    minutes
}

fn timestamp_field(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    let raw = present(value, key)?;
    let parsed = raw
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));
    if parsed.is_none() {
        tracing::debug!(field = key, value = %raw, "Ignoring unparseable status timestamp");
    }
    parsed
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<i64>,
}

impl ToggleRequest {
    pub fn enable(message: Option<String>, estimated_duration: Option<i64>) -> Self {
        Self {
            is_active: true,
            message,
            estimated_duration,
        }
    }

    pub fn disable() -> Self {
        Self {
            is_active: false,
            message: None,
            estimated_duration: None,
        }
    }

    pub fn validate(&self) -> Result<(), MaintenanceError> {
        if let Some(message) = &self.message {
            let len = message.chars().count();
            if len > MAX_MESSAGE_CHARS {
                return Err(MaintenanceError::Validation(format!(
                    "message must be at most {MAX_MESSAGE_CHARS} characters, got {len}"
                )));
            }
        }

        if let Some(minutes) = self.estimated_duration {
            if minutes < 0 {
                return Err(MaintenanceError::Validation(format!(
                    "estimated duration must not be negative, got {minutes}"
                )));
            }
        }

        Ok(())
    }
}

/// Response body of the toggle endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_payload() {
        let state = MaintenanceState::from_value(json!({
            "isActive": true,
            "message": "Upgrading DB",
            "estimatedDuration": 30,
            "activatedBy": "admin@example.com",
            "activatedAt": "2026-03-01T12:00:00.000Z"
        }))
        .unwrap();

        assert!(state.is_active);
        assert_eq!(state.message.as_deref(), Some("Upgrading DB"));
        assert_eq!(state.estimated_duration, Some(30));
        assert_eq!(state.activated_by.as_deref(), Some("admin@example.com"));
        assert!(state.end_time().is_some());
        assert_eq!(state.duration_label(), "30 minutes");
    }

    #[test]
    fn test_parse_accepts_nulls() {
        let state = MaintenanceState::from_value(json!({
            "isActive": false,
            "message": null,
            "estimatedDuration": null
        }))
        .unwrap();

        assert_eq!(state, MaintenanceState::inactive());
    }

    #[test]
    fn test_parse_tolerates_odd_optional_fields() {
        let state = MaintenanceState::from_value(json!({
            "isActive": true,
            "message": "Upgrading DB",
            "estimatedDuration": 30.5
        }))
        .unwrap();
        assert!(state.is_active);
        assert_eq!(state.estimated_duration, Some(31));
        assert_eq!(state.message.as_deref(), Some("Upgrading DB"));

        let state = MaintenanceState::from_value(json!({
            "isActive": true,
            "message": 42,
            "estimatedDuration": "thirty",
            "activatedBy": ["admin"],
            "activatedAt": "Mon Mar 02 2026 10:00:00 GMT+0000"
        }))
        .unwrap();
        assert_eq!(
            state,
            MaintenanceState {
                is_active: true,
                ..MaintenanceState::inactive()
            }
        );
    }

    #[test]
    fn test_parse_rejects_non_boolean_flag() {
        for payload in [json!({}), json!({ "isActive": "true" }), json!({ "isActive": 1 })] {
            let err = MaintenanceState::from_value(payload).unwrap_err();
            assert!(matches!(err, MaintenanceError::Validation(_)));
        }
    }

    #[test]
    fn test_toggle_request_validation() {
        assert!(ToggleRequest::enable(Some("x".repeat(500)), Some(0))
            .validate()
            .is_ok());

        let too_long = ToggleRequest::enable(Some("x".repeat(501)), None);
        assert!(matches!(
            too_long.validate(),
            Err(MaintenanceError::Validation(_))
        ));

        let negative = ToggleRequest::enable(None, Some(-1));
        assert!(matches!(
            negative.validate(),
            Err(MaintenanceError::Validation(_))
        ));
    }

    #[test]
    fn test_message_length_counts_characters() {
        let request = ToggleRequest::enable(Some("é".repeat(500)), None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_toggle_request_omits_absent_fields() {
        let body = serde_json::to_value(ToggleRequest::disable()).unwrap();
        assert_eq!(body, json!({ "isActive": false }));

        let body =
            serde_json::to_value(ToggleRequest::enable(Some("Upgrading DB".into()), Some(30)))
                .unwrap();
        assert_eq!(
            body,
            json!({ "isActive": true, "message": "Upgrading DB", "estimatedDuration": 30 })
        );
    }
}
