use async_trait::async_trait;
use flowmancer_core::dto::execution::ExecutionResult;
use serde_json::json;

use super::{Notifier, NotifyError, check_response};

/// Executes an n8n workflow with the execution result as its data
pub struct N8nNotifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    workflow_id: String,
}

impl N8nNotifier {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        workflow_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            workflow_id: workflow_id.into(),
        }
    }

    fn execute_url(&self) -> String {
        format!("{}/workflows/{}/execute", self.base_url, self.workflow_id)
    }
}

#[async_trait]
impl Notifier for N8nNotifier {
    fn target(&self) -> String {
        format!("n8n:{}", self.workflow_id)
    }

    async fn notify(&self, result: &ExecutionResult) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.execute_url())
            .header("X-N8N-API-KEY", &self.api_key)
            .json(&json!({ "data": result }))
            .send()
            .await?;
        check_response(response).await
    }
}
