//! Execution API Handlers
//!
//! Trigger, batch trigger and read execution records.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use flowmancer_core::domain::execution::ExecutionRecord;
use flowmancer_core::dto::execution::{BatchSummary, BatchTrigger, TriggerExecution};
use flowmancer_core::dto::workflow::Page;
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /api/executions
/// Accepts the trigger and returns the freshly created record
pub async fn trigger_execution(
    State(state): State<AppState>,
    Json(req): Json<TriggerExecution>,
) -> ApiResult<(StatusCode, Json<ExecutionRecord>)> {
    tracing::info!("Triggering workflow: {}", req.workflow_type);

    let record = state
        .orchestrator
        .submit(&req.workflow_type, req.input)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(record)))
}

/// POST /api/executions/batch
pub async fn trigger_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchTrigger>,
) -> ApiResult<Json<BatchSummary>> {
    tracing::info!(
        "Triggering batch of {} for workflow: {}",
        req.inputs.len(),
        req.workflow_type
    );

    let summary = state
        .orchestrator
        .trigger_batch(&req.workflow_type, req.inputs)
        .await;
    Ok(Json(summary))
}

/// GET /api/executions/{id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExecutionRecord>> {
    tracing::debug!("Getting execution: {}", id);

    let record = state
        .orchestrator
        .get_execution(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Execution {} not found", id)))?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ListExecutionsQuery {
    pub workflow_type: String,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl ListExecutionsQuery {
    fn page(&self) -> Page {
        let defaults = Page::default();
        Page {
            skip: self.skip.unwrap_or(defaults.skip),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

/// GET /api/executions?workflow_type=...&skip=&limit=
pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ListExecutionsQuery>,
) -> ApiResult<Json<Vec<ExecutionRecord>>> {
    tracing::debug!("Listing executions for type: {}", query.workflow_type);

    let records = state
        .orchestrator
        .list_executions(&query.workflow_type, query.page())
        .await?;
    Ok(Json(records))
}
