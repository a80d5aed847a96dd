//! Registry
//!
//! Maps a workflow type to a runnable pipeline: the definition snapshot plus
//! the ordered stage implementations it names.

use std::collections::HashMap;
use std::sync::Arc;

use flowmancer_core::domain::workflow::WorkflowDefinition;

use crate::error::TriggerError;
use crate::stage::Stage;
use crate::store::DefinitionStore;

/// Stage implementations by name
#[derive(Default, Clone)]
pub struct StageCatalog {
    stages: HashMap<String, Arc<dyn Stage>>,
}

impl StageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage under its own name, replacing any previous one
    pub fn register<S: Stage + 'static>(&mut self, stage: S) {
        self.register_arc(Arc::new(stage));
    }

    pub fn register_arc(&mut self, stage: Arc<dyn Stage>) {
        self.stages.insert(stage.name().to_string(), stage);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Stage>> {
        self.stages.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stages.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names from `stages` that are not registered, in order
    pub fn unknown_stages(&self, stages: &[String]) -> Vec<String> {
        stages
            .iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for StageCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageCatalog")
            .field("stages", &self.names())
            .finish()
    }
}

/// A definition ready to run
pub struct ResolvedPipeline {
    pub definition: WorkflowDefinition,
    pub stages: Vec<Arc<dyn Stage>>,
}

#[derive(Clone)]
pub struct Registry {
    catalog: Arc<StageCatalog>,
    definitions: Arc<dyn DefinitionStore>,
}

impl Registry {
    pub fn new(catalog: StageCatalog, definitions: Arc<dyn DefinitionStore>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            definitions,
        }
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn definitions(&self) -> &Arc<dyn DefinitionStore> {
        &self.definitions
    }

    /// Checks that every stage name is registered
    pub fn validate_stages(&self, workflow_type: &str, stages: &[String]) -> Result<(), TriggerError> {
        if stages.is_empty() {
            return Err(TriggerError::EmptyPipeline(workflow_type.to_string()));
        }
        match self.catalog.unknown_stages(stages).into_iter().next() {
            Some(stage) => Err(TriggerError::UnknownStage {
                workflow_type: workflow_type.to_string(),
                stage,
            }),
            None => Ok(()),
        }
    }

    /// Resolves an active workflow type to its pipeline
    pub async fn resolve(&self, workflow_type: &str) -> Result<ResolvedPipeline, TriggerError> {
        let definition = self
            .definitions
            .get_by_type(workflow_type)
            .await?
            .ok_or_else(|| TriggerError::UnknownType(workflow_type.to_string()))?;

        if !definition.active {
            return Err(TriggerError::Inactive(workflow_type.to_string()));
        }

        self.validate_stages(workflow_type, &definition.stages)?;

        let stages = definition
            .stages
            .iter()
            .filter_map(|name| self.catalog.get(name))
            .collect();

        Ok(ResolvedPipeline { definition, stages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::FnStage;
    use crate::store::InMemoryDefinitionStore;
    use flowmancer_core::domain::context::{Context, StageOutput};

    fn noop(name: &str) -> FnStage<impl Fn(&Context) -> Result<StageOutput, String> + Send + Sync> {
        FnStage::new(name, |_ctx: &Context| Ok(StageOutput::new()))
    }

    async fn registry_with(defs: Vec<WorkflowDefinition>) -> Registry {
        let mut catalog = StageCatalog::new();
        catalog.register(noop("classify"));
        catalog.register(noop("extract"));

        let store = Arc::new(InMemoryDefinitionStore::new());
        for def in defs {
            store.create(def).await.unwrap();
        }
        Registry::new(catalog, store)
    }

    #[test]
    fn test_catalog_unknown_stages() {
        let mut catalog = StageCatalog::new();
        catalog.register(noop("classify"));
        let stages = vec!["classify".to_string(), "ocr".to_string()];
        assert_eq!(catalog.unknown_stages(&stages), vec!["ocr".to_string()]);
        assert_eq!(catalog.names(), vec!["classify".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_in_order() {
        let def = WorkflowDefinition::new(
            "Docs",
            "docs",
            vec!["extract".into(), "classify".into()],
        );
        let registry = registry_with(vec![def]).await;

        let pipeline = registry.resolve("docs").await.unwrap();
        let names: Vec<&str> = pipeline.stages.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["extract", "classify"]);
    }

    #[tokio::test]
    async fn test_resolve_preconditions() {
        let inactive = WorkflowDefinition::new("Off", "off", vec!["classify".into()]).with_active(false);
        let broken = WorkflowDefinition::new("Broken", "broken", vec!["classify".into(), "ocr".into()]);
        let empty = WorkflowDefinition::new("Empty", "empty", vec![]);
        let registry = registry_with(vec![inactive, broken, empty]).await;

        let err = |r: Result<ResolvedPipeline, TriggerError>| r.err().map(|e| e.code());

        assert_eq!(err(registry.resolve("missing").await), Some("unknown_type"));
        assert_eq!(err(registry.resolve("off").await), Some("inactive"));
        assert_eq!(err(registry.resolve("broken").await), Some("unknown_stage"));
        assert_eq!(err(registry.resolve("empty").await), Some("empty_pipeline"));
    }
}
