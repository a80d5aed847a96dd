//! Workflow definition domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline definition for one workflow type
///
/// Structure shared between the engine (resolves and runs it) and the
/// server (persists it). `workflow_type` is the key used on trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub workflow_type: String,
    /// Ordered stage names, resolved through the stage catalog
    pub stages: Vec<String>,
    pub active: bool,
    #[serde(default)]
    pub integrations: Vec<IntegrationTarget>,
    /// Free-form settings exposed to stages under the `_config` context key
    #[serde(default)]
    pub config: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl WorkflowDefinition {
    /// Creates an active definition with no integrations
    pub fn new(
        name: impl Into<String>,
        workflow_type: impl Into<String>,
        stages: Vec<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            workflow_type: workflow_type.into(),
            stages,
            active: true,
            integrations: Vec::new(),
            config: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_integration(mut self, target: IntegrationTarget) -> Self {
        self.integrations.push(target);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// External destination notified when an execution reaches a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrationTarget {
    /// Plain JSON POST (Zapier catch hooks and similar).
    /// An empty url falls back to the configured default webhook.
    Webhook { url: String },
    /// n8n workflow executed through the n8n REST API
    N8n { workflow_id: String },
}

impl std::fmt::Display for IntegrationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationTarget::Webhook { url } if url.is_empty() => write!(f, "webhook:<default>"),
            IntegrationTarget::Webhook { url } => write!(f, "webhook:{}", url),
            IntegrationTarget::N8n { workflow_id } => write!(f, "n8n:{}", workflow_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integration_target_serialization() {
        let target = IntegrationTarget::N8n {
            workflow_id: "42".to_string(),
        };
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "n8n", "workflow_id": "42"}));

        let parsed: IntegrationTarget =
            serde_json::from_value(serde_json::json!({"kind": "webhook", "url": "https://hooks.example.com/x"}))
                .unwrap();
        assert_eq!(
            parsed,
            IntegrationTarget::Webhook {
                url: "https://hooks.example.com/x".to_string()
            }
        );
    }

    #[test]
    fn test_definition_defaults() {
        let def = WorkflowDefinition::new("Docs", "document_automation", vec!["classify".into()]);
        assert!(def.active);
        assert!(def.integrations.is_empty());
        assert_eq!(def.created_at, def.updated_at);
    }

    #[test]
    fn test_missing_integrations_default_to_empty() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "Leads",
            "description": null,
            "workflow_type": "lead_qualification",
            "stages": ["score_lead"],
            "active": false,
            "created_at": chrono::Utc::now(),
            "updated_at": chrono::Utc::now(),
        });
        let def: WorkflowDefinition = serde_json::from_value(json).unwrap();
        assert!(def.integrations.is_empty());
        assert!(def.config.is_null());
        assert!(!def.active);
    }
}
