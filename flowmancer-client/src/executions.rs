//! Execution endpoints

use std::time::{Duration, Instant};

use flowmancer_core::domain::execution::ExecutionRecord;
use flowmancer_core::dto::execution::{BatchSummary, BatchTrigger, TriggerExecution};
use flowmancer_core::dto::workflow::Page;
use serde_json::Value;
use uuid::Uuid;

use crate::FlowmancerClient;
use crate::error::{ClientError, Result};

impl FlowmancerClient {
    /// Triggers one run and returns the freshly created (pending) record
    pub async fn trigger(&self, workflow_type: &str, input: Value) -> Result<ExecutionRecord> {
        let url = format!("{}/api/executions", self.base_url);
        let req = TriggerExecution {
            workflow_type: workflow_type.to_string(),
            input,
        };
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    pub async fn trigger_batch(&self, workflow_type: &str, inputs: Vec<Value>) -> Result<BatchSummary> {
        let url = format!("{}/api/executions/batch", self.base_url);
        let req = BatchTrigger {
            workflow_type: workflow_type.to_string(),
            inputs,
        };
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    pub async fn get_execution(&self, id: Uuid) -> Result<ExecutionRecord> {
        let url = format!("{}/api/executions/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Executions of a workflow type, newest first
    pub async fn list_executions(&self, workflow_type: &str, page: Page) -> Result<Vec<ExecutionRecord>> {
        let url = format!("{}/api/executions", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("workflow_type", workflow_type)])
            .query(&[("skip", page.skip), ("limit", page.limit)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Polls an execution until it is terminal or `timeout` elapses
    pub async fn wait_for_execution(
        &self,
        id: Uuid,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<ExecutionRecord> {
        let started = Instant::now();
        loop {
            let record = self.get_execution(id).await?;
            if record.is_terminal() {
                return Ok(record);
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(ClientError::Timeout { id, waited });
            }
            tracing::debug!(execution_id = %id, status = %record.status, "Waiting for execution");
            tokio::time::sleep(poll_interval.min(timeout - waited)).await;
        }
    }
}
