//! Engine error types

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by definition and execution stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record to update does not exist
    #[error("record {0} not found")]
    NotFound(Uuid),

    /// A uniqueness constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing storage failed
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Synchronous rejection of a trigger request
///
/// Every variant except `Store` is a precondition failure: no execution
/// record exists for a rejected trigger.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("unknown workflow type '{0}'")]
    UnknownType(String),

    #[error("workflow '{0}' is not active")]
    Inactive(String),

    #[error("workflow '{workflow_type}' references unknown stage '{stage}'")]
    UnknownStage {
        workflow_type: String,
        stage: String,
    },

    #[error("workflow '{0}' has no stages")]
    EmptyPipeline(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TriggerError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TriggerError::UnknownType(_) => "unknown_type",
            TriggerError::Inactive(_) => "inactive",
            TriggerError::UnknownStage { .. } => "unknown_stage",
            TriggerError::EmptyPipeline(_) => "empty_pipeline",
            TriggerError::Store(_) => "store_error",
        }
    }

    pub fn is_precondition(&self) -> bool {
        !matches!(self, TriggerError::Store(_))
    }
}
