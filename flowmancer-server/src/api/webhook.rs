//! Webhook API Handlers
//!
//! Inbound events from automation tools. Events that name a workflow type
//! are turned into triggers; everything else is acknowledged and dropped.

use axum::{
    Json,
    extract::{Path, State},
};
use flowmancer_core::dto::execution::TriggerExecution;
use flowmancer_core::dto::webhook::{WebhookAck, WebhookEvent, trigger_from_payload};
use serde_json::Value;

use super::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /api/webhooks/{source}
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<WebhookAck>> {
    let trigger = match source.as_str() {
        "n8n" | "zapier" => trigger_from_payload(&payload),
        "generic" => {
            let event: WebhookEvent = serde_json::from_value(payload)
                .map_err(|e| ApiError::BadRequest(format!("Invalid webhook event: {}", e)))?;
            tracing::debug!("Generic webhook event: {}", event.event);
            event.trigger_request()
        }
        other => {
            return Err(ApiError::NotFound(format!(
                "Unknown webhook source '{}'",
                other
            )));
        }
    };

    let Some(TriggerExecution {
        workflow_type,
        input,
    }) = trigger
    else {
        tracing::debug!("{} webhook received without trigger", source);
        return Ok(Json(WebhookAck::received(source)));
    };

    tracing::info!("{} webhook triggering workflow: {}", source, workflow_type);

    let id = state.orchestrator.trigger(&workflow_type, input).await?;
    Ok(Json(WebhookAck::triggered(source, id)))
}
