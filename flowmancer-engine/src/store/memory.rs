//! In-memory stores
//!
//! Thread-safe maps behind `RwLock`, used by tests and embedded setups.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use flowmancer_core::domain::execution::{ExecutionRecord, ExecutionStatus};
use flowmancer_core::domain::workflow::WorkflowDefinition;
use flowmancer_core::dto::workflow::Page;
use uuid::Uuid;

use super::{DefinitionStore, ExecutionStore};
use crate::error::{StoreError, StoreResult};

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items.into_iter().skip(page.skip).take(page.limit).collect()
}

// ============================================================================
// Executions
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryExecutionStore {
    records: Arc<RwLock<HashMap<Uuid, ExecutionRecord>>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(
        &self,
        keep: impl Fn(&ExecutionRecord) -> bool,
        page: Page,
    ) -> StoreResult<Vec<ExecutionRecord>> {
        let records = read(&self.records)?;
        let mut matching: Vec<ExecutionRecord> =
            records.values().filter(|r| keep(r)).cloned().collect();
        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(paginate(matching, page))
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn create(&self, record: &ExecutionRecord) -> StoreResult<()> {
        let mut records = write(&self.records)?;
        if records.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!("execution {} already exists", record.id)));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<ExecutionRecord>> {
        Ok(read(&self.records)?.get(&id).cloned())
    }

    async fn update(&self, record: &ExecutionRecord) -> StoreResult<()> {
        let mut records = write(&self.records)?;
        match records.get_mut(&record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    async fn list_by_workflow(&self, workflow_id: Uuid, page: Page) -> StoreResult<Vec<ExecutionRecord>> {
        self.select(|r| r.workflow_id == workflow_id, page)
    }

    async fn list_by_type(&self, workflow_type: &str, page: Page) -> StoreResult<Vec<ExecutionRecord>> {
        self.select(|r| r.workflow_type == workflow_type, page)
    }

    async fn list_by_status(&self, statuses: &[ExecutionStatus]) -> StoreResult<Vec<ExecutionRecord>> {
        let records = read(&self.records)?;
        let mut matching: Vec<ExecutionRecord> = records
            .values()
            .filter(|r| statuses.contains(&r.status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(matching)
    }
}

// ============================================================================
// Definitions
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryDefinitionStore {
    definitions: Arc<RwLock<HashMap<Uuid, WorkflowDefinition>>>,
}

impl InMemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn create(&self, definition: WorkflowDefinition) -> StoreResult<WorkflowDefinition> {
        let mut definitions = write(&self.definitions)?;
        if definitions
            .values()
            .any(|d| d.workflow_type == definition.workflow_type)
        {
            return Err(StoreError::Conflict(format!(
                "workflow type '{}' already exists",
                definition.workflow_type
            )));
        }
        definitions.insert(definition.id, definition.clone());
        Ok(definition)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<WorkflowDefinition>> {
        Ok(read(&self.definitions)?.get(&id).cloned())
    }

    async fn get_by_type(&self, workflow_type: &str) -> StoreResult<Option<WorkflowDefinition>> {
        Ok(read(&self.definitions)?
            .values()
            .find(|d| d.workflow_type == workflow_type)
            .cloned())
    }

    async fn list(&self, page: Page) -> StoreResult<Vec<WorkflowDefinition>> {
        let mut all: Vec<WorkflowDefinition> = read(&self.definitions)?.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(paginate(all, page))
    }

    async fn update(&self, definition: &WorkflowDefinition) -> StoreResult<()> {
        let mut definitions = write(&self.definitions)?;
        match definitions.get_mut(&definition.id) {
            Some(stored) => {
                *stored = definition.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(definition.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(write(&self.definitions)?.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(workflow_type: &str) -> WorkflowDefinition {
        WorkflowDefinition::new("Test", workflow_type, vec!["classify".into()])
    }

    #[tokio::test]
    async fn test_execution_update_requires_existing_record() {
        let store = InMemoryExecutionStore::new();
        let record = ExecutionRecord::pending(&definition("docs"), json!({}));

        assert!(matches!(
            store.update(&record).await,
            Err(StoreError::NotFound(id)) if id == record.id
        ));

        store.create(&record).await.unwrap();
        let mut running = record.clone();
        running.start().unwrap();
        store.update(&running).await.unwrap();

        let stored = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ExecutionStatus::Running);
    }

    #[tokio::test]
    async fn test_execution_listing() {
        let store = InMemoryExecutionStore::new();
        let docs = definition("docs");
        let leads = definition("leads");

        for def in [&docs, &docs, &leads] {
            store
                .create(&ExecutionRecord::pending(def, json!({})))
                .await
                .unwrap();
        }

        assert_eq!(store.list_by_workflow(docs.id, Page::default()).await.unwrap().len(), 2);
        assert_eq!(store.list_by_type("leads", Page::default()).await.unwrap().len(), 1);

        let page = Page { skip: 1, limit: 10 };
        assert_eq!(store.list_by_workflow(docs.id, page).await.unwrap().len(), 1);

        let pending = store.list_by_status(&[ExecutionStatus::Pending]).await.unwrap();
        assert_eq!(pending.len(), 3);
        assert!(store.list_by_status(&[ExecutionStatus::Failed]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_definition_type_is_unique() {
        let store = InMemoryDefinitionStore::new();
        store.create(definition("docs")).await.unwrap();

        let err = store.create(definition("docs")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list(Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_definition_crud() {
        let store = InMemoryDefinitionStore::new();
        let mut def = store.create(definition("docs")).await.unwrap();

        assert!(store.get_by_type("docs").await.unwrap().is_some());

        def.active = false;
        store.update(&def).await.unwrap();
        assert!(!store.get(def.id).await.unwrap().unwrap().active);

        assert!(store.delete(def.id).await.unwrap());
        assert!(!store.delete(def.id).await.unwrap());
        assert!(store.get_by_type("docs").await.unwrap().is_none());
    }
}
