//! Workflow Service
//!
//! Definition management: validation against the stage catalog, CRUD and
//! per-definition execution history.

use flowmancer_core::domain::execution::ExecutionRecord;
use flowmancer_core::domain::workflow::{IntegrationTarget, WorkflowDefinition};
use flowmancer_core::dto::workflow::{CreateWorkflow, Page, UpdateWorkflow};
use flowmancer_engine::stage::builtin;
use flowmancer_engine::{Orchestrator, StoreError};
use uuid::Uuid;

/// Service error type
#[derive(Debug)]
pub enum WorkflowError {
    NotFound(Uuid),
    ValidationError(String),
    Conflict(String),
    StoreError(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WorkflowError::NotFound(id),
            StoreError::Conflict(msg) => WorkflowError::Conflict(msg),
            other => WorkflowError::StoreError(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Create a new workflow definition
pub async fn create_workflow(orchestrator: &Orchestrator, req: CreateWorkflow) -> Result<WorkflowDefinition> {
    let definition = req.into_definition();
    validate_definition(orchestrator, &definition)?;

    let definitions = orchestrator.registry().definitions();
    if definitions.get_by_type(&definition.workflow_type).await?.is_some() {
        return Err(WorkflowError::Conflict(format!(
            "Workflow type '{}' already exists",
            definition.workflow_type
        )));
    }

    let created = definitions.create(definition).await?;

    tracing::info!("Workflow created: {} ({})", created.workflow_type, created.id);

    Ok(created)
}

/// Get a workflow definition by ID
pub async fn get_workflow(orchestrator: &Orchestrator, id: Uuid) -> Result<WorkflowDefinition> {
    orchestrator
        .registry()
        .definitions()
        .get(id)
        .await?
        .ok_or(WorkflowError::NotFound(id))
}

pub async fn list_workflows(orchestrator: &Orchestrator, page: Page) -> Result<Vec<WorkflowDefinition>> {
    Ok(orchestrator.registry().definitions().list(page).await?)
}

/// Apply a partial update; the result must still be a valid definition
pub async fn update_workflow(
    orchestrator: &Orchestrator,
    id: Uuid,
    req: UpdateWorkflow,
) -> Result<WorkflowDefinition> {
    let mut definition = get_workflow(orchestrator, id).await?;

    if req.is_empty() {
        return Ok(definition);
    }

    req.apply_to(&mut definition);
    validate_definition(orchestrator, &definition)?;

    orchestrator.registry().definitions().update(&definition).await?;

    tracing::info!(
        "Workflow updated: {} ({}, active: {})",
        definition.workflow_type,
        definition.id,
        definition.active
    );

    Ok(definition)
}

/// Delete a workflow definition; its execution records are kept
pub async fn delete_workflow(orchestrator: &Orchestrator, id: Uuid) -> Result<()> {
    let deleted = orchestrator.registry().definitions().delete(id).await?;

    if !deleted {
        return Err(WorkflowError::NotFound(id));
    }

    tracing::info!("Workflow deleted: {}", id);

    Ok(())
}

/// Executions of one definition, newest first
pub async fn list_workflow_executions(
    orchestrator: &Orchestrator,
    id: Uuid,
    page: Page,
) -> Result<Vec<ExecutionRecord>> {
    let definition = get_workflow(orchestrator, id).await?;
    Ok(orchestrator
        .executions()
        .list_by_workflow(definition.id, page)
        .await?)
}

/// Create the built-in definitions whose workflow types are not taken yet
pub async fn seed_default_workflows(orchestrator: &Orchestrator) -> Result<usize> {
    let definitions = orchestrator.registry().definitions();
    let mut created = 0;

    for definition in builtin::default_definitions() {
        if definitions.get_by_type(&definition.workflow_type).await?.is_some() {
            continue;
        }
        match definitions.create(definition).await {
            Ok(def) => {
                tracing::info!("Seeded workflow: {}", def.workflow_type);
                created += 1;
            }
            Err(StoreError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(created)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_definition(orchestrator: &Orchestrator, def: &WorkflowDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(WorkflowError::ValidationError(
            "Workflow name cannot be empty".to_string(),
        ));
    }

    if def.name.len() > 255 {
        return Err(WorkflowError::ValidationError(
            "Workflow name is too long (max 255 characters)".to_string(),
        ));
    }

    validate_workflow_type(&def.workflow_type)?;

    orchestrator
        .registry()
        .validate_stages(&def.workflow_type, &def.stages)
        .map_err(|e| WorkflowError::ValidationError(e.to_string()))?;

    for target in &def.integrations {
        match target {
            IntegrationTarget::Webhook { url } => {
                if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(WorkflowError::ValidationError(format!(
                        "Webhook url must start with http:// or https://, got '{}'",
                        url
                    )));
                }
            }
            IntegrationTarget::N8n { workflow_id } => {
                if workflow_id.trim().is_empty() {
                    return Err(WorkflowError::ValidationError(
                        "n8n workflow_id cannot be empty".to_string(),
                    ));
                }
            }
        }
    }

    Ok(())
}

fn validate_workflow_type(workflow_type: &str) -> Result<()> {
    if workflow_type.is_empty() || workflow_type.len() > 100 {
        return Err(WorkflowError::ValidationError(
            "Workflow type must be between 1 and 100 characters".to_string(),
        ));
    }

    if !workflow_type
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(WorkflowError::ValidationError(format!(
            "Workflow type '{}' may only contain lowercase letters, digits and underscores",
            workflow_type
        )));
    }

    Ok(())
}
