//! Inbound webhook DTOs
//!
//! External automation tools (n8n, Zapier, anything else) post events to
//! the server. An event only starts a workflow when it names one; every
//! other event is acknowledged and dropped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::execution::TriggerExecution;

/// Event prefix that turns a generic webhook into a trigger
pub const TRIGGER_EVENT_PREFIX: &str = "trigger.";

/// Generic webhook payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl WebhookEvent {
    /// `trigger.<workflow_type>` events start that workflow with `data` as input
    pub fn trigger_request(&self) -> Option<TriggerExecution> {
        let workflow_type = self.event.strip_prefix(TRIGGER_EVENT_PREFIX)?;
        if workflow_type.is_empty() {
            return None;
        }
        Some(TriggerExecution {
            workflow_type: workflow_type.to_string(),
            input: self.data.clone(),
        })
    }
}

/// Extracts a trigger from a tool-specific payload (n8n, Zapier)
///
/// The payload must carry a string `workflow_type`; the input is its `data`
/// field when present, otherwise the payload minus `workflow_type`.
pub fn trigger_from_payload(payload: &serde_json::Value) -> Option<TriggerExecution> {
    let object = payload.as_object()?;
    let workflow_type = object.get("workflow_type")?.as_str()?;
    if workflow_type.is_empty() {
        return None;
    }

    let input = match object.get("data") {
        Some(data) => data.clone(),
        None => {
            let mut rest = object.clone();
            rest.remove("workflow_type");
            serde_json::Value::Object(rest)
        }
    };

    Some(TriggerExecution {
        workflow_type: workflow_type.to_string(),
        input,
    })
}

/// Acknowledgement returned to webhook senders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
    pub source: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<Uuid>,
}

impl WebhookAck {
    pub fn received(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            status: "received".to_string(),
            message: format!("{} webhook processed", source),
            source,
            execution_id: None,
        }
    }

    pub fn triggered(source: impl Into<String>, execution_id: Uuid) -> Self {
        Self {
            status: "triggered".to_string(),
            source: source.into(),
            message: format!("execution {} started", execution_id),
            execution_id: Some(execution_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generic_trigger_event() {
        let event = WebhookEvent {
            event: "trigger.email_processing".to_string(),
            data: json!({"subject": "help"}),
            timestamp: None,
        };
        let req = event.trigger_request().unwrap();
        assert_eq!(req.workflow_type, "email_processing");
        assert_eq!(req.input, json!({"subject": "help"}));
    }

    #[test]
    fn test_generic_non_trigger_event() {
        let event = WebhookEvent {
            event: "lead.updated".to_string(),
            data: json!({}),
            timestamp: None,
        };
        assert!(event.trigger_request().is_none());

        let empty = WebhookEvent {
            event: "trigger.".to_string(),
            data: json!({}),
            timestamp: None,
        };
        assert!(empty.trigger_request().is_none());
    }

    #[test]
    fn test_payload_with_data_field() {
        let req = trigger_from_payload(&json!({
            "workflow_type": "lead_qualification",
            "data": {"name": "Ada"}
        }))
        .unwrap();
        assert_eq!(req.input, json!({"name": "Ada"}));
    }

    #[test]
    fn test_payload_without_data_field_uses_rest() {
        let req = trigger_from_payload(&json!({
            "workflow_type": "lead_qualification",
            "name": "Ada",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert_eq!(req.input, json!({"name": "Ada", "email": "ada@example.com"}));
    }

    #[test]
    fn test_payload_without_workflow_type() {
        assert!(trigger_from_payload(&json!({"name": "Ada"})).is_none());
        assert!(trigger_from_payload(&json!([1, 2])).is_none());
    }
}
