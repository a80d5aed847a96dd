//! Workflow definition endpoints

use flowmancer_core::domain::execution::ExecutionRecord;
use flowmancer_core::domain::workflow::WorkflowDefinition;
use flowmancer_core::dto::workflow::{CreateWorkflow, Page, UpdateWorkflow};
use uuid::Uuid;

use crate::FlowmancerClient;
use crate::error::Result;

impl FlowmancerClient {
    // =============================================================================
    // Workflow Management
    // =============================================================================

    pub async fn create_workflow(&self, req: &CreateWorkflow) -> Result<WorkflowDefinition> {
        let url = format!("{}/api/workflows", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    pub async fn list_workflows(&self, page: Page) -> Result<Vec<WorkflowDefinition>> {
        let url = format!("{}/api/workflows", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("skip", page.skip), ("limit", page.limit)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn get_workflow(&self, id: Uuid) -> Result<WorkflowDefinition> {
        let url = format!("{}/api/workflows/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Applies a partial update; absent fields stay unchanged
    pub async fn update_workflow(&self, id: Uuid, req: &UpdateWorkflow) -> Result<WorkflowDefinition> {
        let url = format!("{}/api/workflows/{}", self.base_url, id);
        let response = self.client.put(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    pub async fn set_workflow_active(&self, id: Uuid, active: bool) -> Result<WorkflowDefinition> {
        let req = UpdateWorkflow {
            active: Some(active),
            ..Default::default()
        };
        self.update_workflow(id, &req).await
    }

    pub async fn delete_workflow(&self, id: Uuid) -> Result<()> {
        let url = format!("{}/api/workflows/{}", self.base_url, id);
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Executions of one definition, newest first
    pub async fn list_workflow_executions(&self, id: Uuid, page: Page) -> Result<Vec<ExecutionRecord>> {
        let url = format!("{}/api/workflows/{}/executions", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[("skip", page.skip), ("limit", page.limit)])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
