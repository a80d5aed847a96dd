//! Workflow DTOs

use serde::{Deserialize, Serialize};

use crate::domain::workflow::{IntegrationTarget, WorkflowDefinition};

/// Request to create a new workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflow {
    pub name: String,
    pub description: Option<String>,
    pub workflow_type: String,
    pub stages: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub integrations: Vec<IntegrationTarget>,
    #[serde(default)]
    pub config: serde_json::Value,
}

fn default_active() -> bool {
    true
}

impl CreateWorkflow {
    pub fn into_definition(self) -> WorkflowDefinition {
        let mut def = WorkflowDefinition::new(self.name, self.workflow_type, self.stages)
            .with_active(self.active);
        def.description = self.description;
        def.integrations = self.integrations;
        def.config = self.config;
        def
    }
}

/// Partial update of a workflow definition; absent fields are left unchanged
///
/// `workflow_type` is not updatable: it is the trigger key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkflow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub stages: Option<Vec<String>>,
    pub active: Option<bool>,
    pub integrations: Option<Vec<IntegrationTarget>>,
    pub config: Option<serde_json::Value>,
}

impl UpdateWorkflow {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.stages.is_none()
            && self.active.is_none()
            && self.integrations.is_none()
            && self.config.is_none()
    }

    /// Applies the present fields and bumps `updated_at`
    pub fn apply_to(self, def: &mut WorkflowDefinition) {
        if let Some(name) = self.name {
            def.name = name;
        }
        if let Some(description) = self.description {
            def.description = Some(description);
        }
        if let Some(stages) = self.stages {
            def.stages = stages;
        }
        if let Some(active) = self.active {
            def.active = active;
        }
        if let Some(integrations) = self.integrations {
            def.integrations = integrations;
        }
        if let Some(config) = self.config {
            def.config = config;
        }
        def.updated_at = chrono::Utc::now();
    }
}

/// Offset pagination used by list endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}
