//! Execution Repository
//!
//! Execution records live in `workflow_executions`. Structured columns
//! (error, stage logs) are stored as JSONB.

use async_trait::async_trait;
use flowmancer_core::domain::execution::{ExecutionError, ExecutionRecord, ExecutionStatus, StageLog};
use flowmancer_core::dto::workflow::Page;
use flowmancer_engine::{ExecutionStore, StoreError, StoreResult};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{offset, store_error};

const COLUMNS: &str = "id, workflow_id, workflow_type, stages, status, input, output, error, \
                       stage_logs, started_at, completed_at, duration_ms";

#[derive(Clone)]
pub struct PgExecutionStore {
    pool: PgPool,
}

impl PgExecutionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str, binds: Binds<'_>) -> StoreResult<Vec<ExecutionRecord>> {
        let query = sqlx::query_as::<_, ExecutionRow>(sql);
        let query = match binds {
            Binds::Workflow(id, skip, limit) => query.bind(id).bind(skip).bind(limit),
            Binds::Type(workflow_type, skip, limit) => query.bind(workflow_type).bind(skip).bind(limit),
            Binds::Statuses(statuses) => query.bind(statuses),
        };

        let rows = query.fetch_all(&self.pool).await.map_err(store_error)?;
        rows.into_iter().map(ExecutionRecord::try_from).collect()
    }
}

enum Binds<'a> {
    Workflow(Uuid, i64, i64),
    Type(&'a str, i64, i64),
    Statuses(Vec<String>),
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn create(&self, record: &ExecutionRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workflow_executions (id, workflow_id, workflow_type, stages, status, input,
                                             output, error, stage_logs, started_at, completed_at, duration_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(record.workflow_id)
        .bind(&record.workflow_type)
        .bind(&record.stages)
        .bind(record.status.as_str())
        .bind(&record.input)
        .bind(&record.output)
        .bind(record.error.as_ref().map(Json))
        .bind(Json(&record.stage_logs))
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(record.duration_ms)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<ExecutionRecord>> {
        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            "SELECT {} FROM workflow_executions WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(ExecutionRecord::try_from).transpose()
    }

    async fn update(&self, record: &ExecutionRecord) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE workflow_executions
            SET status = $1, output = $2, error = $3, stage_logs = $4,
                completed_at = $5, duration_ms = $6
            WHERE id = $7
            "#,
        )
        .bind(record.status.as_str())
        .bind(&record.output)
        .bind(record.error.as_ref().map(Json))
        .bind(Json(&record.stage_logs))
        .bind(record.completed_at)
        .bind(record.duration_ms)
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }

    async fn list_by_workflow(&self, workflow_id: Uuid, page: Page) -> StoreResult<Vec<ExecutionRecord>> {
        let (skip, limit) = offset(page);
        let sql = format!(
            "SELECT {} FROM workflow_executions WHERE workflow_id = $1 \
             ORDER BY started_at DESC OFFSET $2 LIMIT $3",
            COLUMNS
        );
        self.fetch(&sql, Binds::Workflow(workflow_id, skip, limit)).await
    }

    async fn list_by_type(&self, workflow_type: &str, page: Page) -> StoreResult<Vec<ExecutionRecord>> {
        let (skip, limit) = offset(page);
        let sql = format!(
            "SELECT {} FROM workflow_executions WHERE workflow_type = $1 \
             ORDER BY started_at DESC OFFSET $2 LIMIT $3",
            COLUMNS
        );
        self.fetch(&sql, Binds::Type(workflow_type, skip, limit)).await
    }

    async fn list_by_status(&self, statuses: &[ExecutionStatus]) -> StoreResult<Vec<ExecutionRecord>> {
        let sql = format!(
            "SELECT {} FROM workflow_executions WHERE status = ANY($1) ORDER BY started_at ASC",
            COLUMNS
        );
        let statuses = statuses.iter().map(|s| s.as_str().to_string()).collect();
        self.fetch(&sql, Binds::Statuses(statuses)).await
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ExecutionRow {
    id: Uuid,
    workflow_id: Uuid,
    workflow_type: String,
    stages: Vec<String>,
    status: String,
    input: serde_json::Value,
    output: Option<serde_json::Value>,
    error: Option<Json<ExecutionError>>,
    stage_logs: Json<Vec<StageLog>>,
    started_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    duration_ms: Option<i64>,
}

impl TryFrom<ExecutionRow> for ExecutionRecord {
    type Error = StoreError;

    fn try_from(row: ExecutionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ExecutionStatus>()
            .map_err(StoreError::Backend)?;

        Ok(ExecutionRecord {
            id: row.id,
            workflow_id: row.workflow_id,
            workflow_type: row.workflow_type,
            stages: row.stages,
            status,
            input: row.input,
            output: row.output,
            error: row.error.map(|e| e.0),
            stage_logs: row.stage_logs.0,
            started_at: row.started_at,
            completed_at: row.completed_at,
            duration_ms: row.duration_ms,
        })
    }
}
