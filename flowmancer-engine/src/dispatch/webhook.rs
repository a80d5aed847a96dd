use async_trait::async_trait;
use flowmancer_core::dto::execution::ExecutionResult;

use super::{Notifier, NotifyError, check_response};

/// Posts the execution result as JSON to a URL (Zapier catch hooks and similar)
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn target(&self) -> String {
        format!("webhook:{}", self.url)
    }

    async fn notify(&self, result: &ExecutionResult) -> Result<(), NotifyError> {
        let response = self.http.post(&self.url).json(result).send().await?;
        check_response(response).await
    }
}
