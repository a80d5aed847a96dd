//! Integration dispatch
//!
//! Once a run is terminal and persisted, its result is sent to every
//! integration target of the definition. Deliveries run concurrently and
//! independently: a failure is logged and counted, never retried, and never
//! changes the execution record.

mod n8n;
mod webhook;

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use flowmancer_core::domain::execution::ExecutionRecord;
use flowmancer_core::domain::workflow::IntegrationTarget;
use flowmancer_core::dto::execution::ExecutionResult;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Settings;

pub use n8n::N8nNotifier;
pub use webhook::WebhookNotifier;

/// Delivery failure for one target
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("target responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

/// A single delivery destination
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable target description used in logs
    fn target(&self) -> String;

    async fn notify(&self, result: &ExecutionResult) -> Result<(), NotifyError>;
}

/// Builds notifiers for integration targets
pub trait NotifierFactory: Send + Sync {
    /// `None` when the target cannot be delivered with the current settings
    fn build(&self, target: &IntegrationTarget) -> Option<Arc<dyn Notifier>>;
}

/// Notifier factory backed by reqwest
pub struct HttpNotifierFactory {
    http: reqwest::Client,
    settings: Arc<Settings>,
}

impl HttpNotifierFactory {
    pub fn new(settings: Arc<Settings>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.notify_timeout)
            .user_agent(format!("{}/{}", settings.app_name, env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build notification HTTP client")?;

        Ok(Self { http, settings })
    }
}

impl NotifierFactory for HttpNotifierFactory {
    fn build(&self, target: &IntegrationTarget) -> Option<Arc<dyn Notifier>> {
        match target {
            IntegrationTarget::Webhook { url } => {
                let url = if url.is_empty() {
                    self.settings.zapier_webhook_url.clone()?
                } else {
                    url.clone()
                };
                Some(Arc::new(WebhookNotifier::new(self.http.clone(), url)))
            }
            IntegrationTarget::N8n { workflow_id } => {
                let base_url = self.settings.n8n_api_url.clone()?;
                let api_key = self.settings.n8n_api_key.clone()?;
                Some(Arc::new(N8nNotifier::new(
                    self.http.clone(),
                    base_url,
                    api_key,
                    workflow_id.clone(),
                )))
            }
        }
    }
}

/// Outcome counts of one dispatch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct Dispatcher {
    factory: Arc<dyn NotifierFactory>,
}

impl Dispatcher {
    pub fn new(factory: Arc<dyn NotifierFactory>) -> Self {
        Self { factory }
    }

    /// Notifies every target of a terminal record
    pub async fn dispatch(
        &self,
        record: &ExecutionRecord,
        targets: &[IntegrationTarget],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        if !record.is_terminal() {
            warn!(execution_id = %record.id, status = %record.status, "Refusing to dispatch non-terminal execution");
            report.skipped = targets.len();
            return report;
        }

        let mut notifiers = Vec::with_capacity(targets.len());
        for target in targets {
            match self.factory.build(target) {
                Some(notifier) => notifiers.push(notifier),
                None => {
                    info!(execution_id = %record.id, target = %target, "Integration not configured, skipping");
                    report.skipped += 1;
                }
            }
        }

        if notifiers.is_empty() {
            return report;
        }

        let result = ExecutionResult::from(record);
        let outcomes = join_all(notifiers.iter().map(|notifier| {
            let result = &result;
            async move { (notifier.target(), notifier.notify(result).await) }
        }))
        .await;

        for (target, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    debug!(execution_id = %record.id, target = %target, "Integration notified");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(execution_id = %record.id, target = %target, error = %e, "Integration notification failed");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Maps non-2xx responses to `NotifyError::Status`
async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}
