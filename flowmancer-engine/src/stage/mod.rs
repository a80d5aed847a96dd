//! Stages
//!
//! A stage is a named unit of work over the run context. It reads the
//! context and returns only the fields it produced; the orchestrator merges
//! them into the context handed to the next stage.
//!
//! Expected domain outcomes ("document type unknown", "missing field") are
//! output values. A [`StageError`] means the stage could not produce a
//! result at all.

pub mod builtin;
pub mod prompt;

use async_trait::async_trait;
use flowmancer_core::domain::context::{Context, StageOutput};
use serde_json::{Value, json};

pub use prompt::{LlmClient, PromptStage};

/// A stage failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stage '{stage}' failed: {message}")]
pub struct StageError {
    pub stage: String,
    pub message: String,
}

impl StageError {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Opaque unit of context transformation
#[async_trait]
pub trait Stage: Send + Sync {
    /// Name under which the stage is registered
    fn name(&self) -> &str;

    /// Produces this stage's fields from the accumulated context
    async fn apply(&self, context: &Context) -> Result<StageOutput, StageError>;
}

/// Stage backed by a synchronous closure
pub struct FnStage<F> {
    name: String,
    f: F,
}

impl<F> FnStage<F>
where
    F: Fn(&Context) -> Result<StageOutput, String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&Context) -> Result<StageOutput, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, context: &Context) -> Result<StageOutput, StageError> {
        (self.f)(context).map_err(|message| StageError::new(&self.name, message))
    }
}

/// Checks that the context carries a set of fields
///
/// Emits `<prefix>_valid` and `<prefix>_errors`; missing fields are a
/// validation result, never a stage error.
pub struct RequiredFieldsStage {
    name: String,
    prefix: String,
    fields: Vec<String>,
}

impl RequiredFieldsStage {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Stage for RequiredFieldsStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, context: &Context) -> Result<StageOutput, StageError> {
        let errors: Vec<Value> = self
            .fields
            .iter()
            .filter(|field| match context.lookup(field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(|field| json!(format!("Missing required field: {}", field)))
            .collect();

        let mut output = StageOutput::new();
        output.insert(format!("{}_valid", self.prefix), json!(errors.is_empty()));
        output.insert(format!("{}_errors", self.prefix), Value::Array(errors));
        Ok(output)
    }
}
