//! Stores
//!
//! Persistence seams for workflow definitions and execution records. The
//! engine ships in-memory implementations; the server provides PostgreSQL
//! ones.

mod memory;

use async_trait::async_trait;
use flowmancer_core::domain::execution::{ExecutionRecord, ExecutionStatus};
use flowmancer_core::domain::workflow::WorkflowDefinition;
use flowmancer_core::dto::workflow::Page;
use uuid::Uuid;

use crate::error::StoreResult;

pub use memory::{InMemoryDefinitionStore, InMemoryExecutionStore};

/// Execution record persistence, keyed by execution id
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn create(&self, record: &ExecutionRecord) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<ExecutionRecord>>;

    /// Replaces a stored record; `NotFound` if it was never created
    async fn update(&self, record: &ExecutionRecord) -> StoreResult<()>;

    /// Records of one definition, newest first
    async fn list_by_workflow(&self, workflow_id: Uuid, page: Page) -> StoreResult<Vec<ExecutionRecord>>;

    /// Records of one workflow type, newest first
    async fn list_by_type(&self, workflow_type: &str, page: Page) -> StoreResult<Vec<ExecutionRecord>>;

    /// Records in any of the given states, oldest first
    async fn list_by_status(&self, statuses: &[ExecutionStatus]) -> StoreResult<Vec<ExecutionRecord>>;
}

/// Workflow definition persistence; `workflow_type` is unique
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// `Conflict` when the workflow type is already taken
    async fn create(&self, definition: WorkflowDefinition) -> StoreResult<WorkflowDefinition>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<WorkflowDefinition>>;

    async fn get_by_type(&self, workflow_type: &str) -> StoreResult<Option<WorkflowDefinition>>;

    /// Definitions ordered by creation time, oldest first
    async fn list(&self, page: Page) -> StoreResult<Vec<WorkflowDefinition>>;

    async fn update(&self, definition: &WorkflowDefinition) -> StoreResult<()>;

    /// Returns whether a definition was removed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}
