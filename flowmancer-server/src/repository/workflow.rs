//! Workflow Repository
//!
//! Definitions live in the `workflows` table; `workflow_type` is unique.

use async_trait::async_trait;
use flowmancer_core::domain::workflow::{IntegrationTarget, WorkflowDefinition};
use flowmancer_core::dto::workflow::Page;
use flowmancer_engine::{DefinitionStore, StoreError, StoreResult};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{offset, store_error};

const COLUMNS: &str =
    "id, name, description, workflow_type, stages, active, integrations, config, created_at, updated_at";

#[derive(Clone)]
pub struct PgDefinitionStore {
    pool: PgPool,
}

impl PgDefinitionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DefinitionStore for PgDefinitionStore {
    async fn create(&self, definition: WorkflowDefinition) -> StoreResult<WorkflowDefinition> {
        sqlx::query(
            r#"
            INSERT INTO workflows (id, name, description, workflow_type, stages, active,
                                   integrations, config, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(definition.id)
        .bind(&definition.name)
        .bind(&definition.description)
        .bind(&definition.workflow_type)
        .bind(&definition.stages)
        .bind(definition.active)
        .bind(Json(&definition.integrations))
        .bind(&definition.config)
        .bind(definition.created_at)
        .bind(definition.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(definition)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<WorkflowDefinition>> {
        let row = sqlx::query_as::<_, WorkflowRow>(&format!(
            "SELECT {} FROM workflows WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Into::into))
    }

    async fn get_by_type(&self, workflow_type: &str) -> StoreResult<Option<WorkflowDefinition>> {
        let row = sqlx::query_as::<_, WorkflowRow>(&format!(
            "SELECT {} FROM workflows WHERE workflow_type = $1",
            COLUMNS
        ))
        .bind(workflow_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, page: Page) -> StoreResult<Vec<WorkflowDefinition>> {
        let (skip, limit) = offset(page);
        let rows = sqlx::query_as::<_, WorkflowRow>(&format!(
            "SELECT {} FROM workflows ORDER BY created_at ASC OFFSET $1 LIMIT $2",
            COLUMNS
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, definition: &WorkflowDefinition) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET name = $1, description = $2, stages = $3, active = $4,
                integrations = $5, config = $6, updated_at = $7
            WHERE id = $8
            "#,
        )
        .bind(&definition.name)
        .bind(&definition.description)
        .bind(&definition.stages)
        .bind(definition.active)
        .bind(Json(&definition.integrations))
        .bind(&definition.config)
        .bind(definition.updated_at)
        .bind(definition.id)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(definition.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct WorkflowRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    workflow_type: String,
    stages: Vec<String>,
    active: bool,
    integrations: Json<Vec<IntegrationTarget>>,
    config: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<WorkflowRow> for WorkflowDefinition {
    fn from(row: WorkflowRow) -> Self {
        WorkflowDefinition {
            id: row.id,
            name: row.name,
            description: row.description,
            workflow_type: row.workflow_type,
            stages: row.stages,
            active: row.active,
            integrations: row.integrations.0,
            config: row.config,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
