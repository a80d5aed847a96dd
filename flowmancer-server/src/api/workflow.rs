//! Workflow API Handlers
//!
//! HTTP endpoints for workflow definition management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use flowmancer_core::domain::execution::ExecutionRecord;
use flowmancer_core::domain::workflow::WorkflowDefinition;
use flowmancer_core::dto::workflow::{CreateWorkflow, Page, UpdateWorkflow};
use uuid::Uuid;

use super::AppState;
use crate::api::error::ApiResult;
use crate::service::workflow_service;

/// GET /api/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<WorkflowDefinition>>> {
    tracing::debug!("Listing workflows (skip: {}, limit: {})", page.skip, page.limit);

    let workflows = workflow_service::list_workflows(&state.orchestrator, page).await?;
    Ok(Json(workflows))
}

/// POST /api/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    Json(req): Json<CreateWorkflow>,
) -> ApiResult<(StatusCode, Json<WorkflowDefinition>)> {
    tracing::info!("Creating workflow: {} ({})", req.name, req.workflow_type);

    let workflow = workflow_service::create_workflow(&state.orchestrator, req).await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

/// GET /api/workflows/{id}
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WorkflowDefinition>> {
    tracing::debug!("Getting workflow: {}", id);

    let workflow = workflow_service::get_workflow(&state.orchestrator, id).await?;
    Ok(Json(workflow))
}

/// PUT /api/workflows/{id}
pub async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateWorkflow>,
) -> ApiResult<Json<WorkflowDefinition>> {
    tracing::info!("Updating workflow: {}", id);

    let workflow = workflow_service::update_workflow(&state.orchestrator, id, req).await?;
    Ok(Json(workflow))
}

/// DELETE /api/workflows/{id}
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting workflow: {}", id);

    workflow_service::delete_workflow(&state.orchestrator, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/workflows/{id}/executions
pub async fn list_workflow_executions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Page>,
) -> ApiResult<Json<Vec<ExecutionRecord>>> {
    tracing::debug!("Listing executions for workflow: {}", id);

    let executions =
        workflow_service::list_workflow_executions(&state.orchestrator, id, page).await?;
    Ok(Json(executions))
}
