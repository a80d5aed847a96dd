//! Execution DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::execution::{ExecutionError, ExecutionRecord, ExecutionStatus};

/// Request to trigger one execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerExecution {
    pub workflow_type: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Request to trigger one execution per input against the same workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTrigger {
    pub workflow_type: String,
    pub inputs: Vec<serde_json::Value>,
}

/// Outcome of one batch entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Trigger accepted; the run proceeds independently
    Accepted { index: usize, execution_id: Uuid },
    /// Trigger rejected synchronously; no record exists for this entry
    Rejected {
        index: usize,
        code: String,
        error: String,
    },
}

impl BatchOutcome {
    pub fn index(&self) -> usize {
        match self {
            BatchOutcome::Accepted { index, .. } | BatchOutcome::Rejected { index, .. } => *index,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, BatchOutcome::Accepted { .. })
    }
}

/// Aggregate result of a batch trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: Vec<BatchOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_accepted()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        }
    }
}

/// Payload delivered to integration targets after a terminal transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub execution_id: Uuid,
    pub workflow_id: Uuid,
    pub workflow_type: String,
    pub status: ExecutionStatus,
    pub output: Option<serde_json::Value>,
    pub error: Option<ExecutionError>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_ms: Option<i64>,
}

impl From<&ExecutionRecord> for ExecutionResult {
    fn from(record: &ExecutionRecord) -> Self {
        Self {
            execution_id: record.id,
            workflow_id: record.workflow_id,
            workflow_type: record.workflow_type.clone(),
            status: record.status,
            output: record.output.clone(),
            error: record.error.clone(),
            completed_at: record.completed_at,
            duration_ms: record.duration_ms,
        }
    }
}
