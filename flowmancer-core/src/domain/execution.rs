//! Execution record domain types
//!
//! An [`ExecutionRecord`] tracks one run of a workflow definition against one
//! input. Status changes go through [`ExecutionRecord::start`],
//! [`ExecutionRecord::complete`] and [`ExecutionRecord::fail`], which reject
//! any transition out of a terminal state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::workflow::WorkflowDefinition;

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(format!("unknown execution status: {}", other)),
        }
    }
}

/// Category of a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A stage reported that it could not produce a result
    Stage,
    /// The engine itself failed mid-run (store unavailable, panicking stage)
    Internal,
    /// The process stopped before the run reached a terminal state
    Interrupted,
}

/// Structured error stored on a failed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub kind: ErrorKind,
    pub stage: Option<String>,
    pub message: String,
}

impl ExecutionError {
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Stage,
            stage: Some(stage.into()),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            stage: None,
            message: message.into(),
        }
    }

    pub fn interrupted() -> Self {
        Self {
            kind: ErrorKind::Interrupted,
            stage: None,
            message: "execution was interrupted before reaching a terminal state".to_string(),
        }
    }
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.stage {
            Some(stage) => write!(f, "stage '{}' failed: {}", stage, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of a single stage invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
}

/// Per-stage trace entry, one for every stage that was actually invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLog {
    pub stage: String,
    pub status: StageStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub error: Option<String>,
}

/// Illegal status change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid execution transition {from} -> {to}")]
pub struct TransitionError {
    pub from: ExecutionStatus,
    pub to: ExecutionStatus,
}

/// Execution record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub workflow_type: String,
    /// Stage sequence this run was created against
    pub stages: Vec<String>,
    pub status: ExecutionStatus,
    pub input: serde_json::Value,
    pub output: Option<serde_json::Value>,
    pub error: Option<ExecutionError>,
    #[serde(default)]
    pub stage_logs: Vec<StageLog>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_ms: Option<i64>,
}

impl ExecutionRecord {
    /// Creates a pending record snapshotting the definition's stage list
    pub fn pending(definition: &WorkflowDefinition, input: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id: definition.id,
            workflow_type: definition.workflow_type.clone(),
            stages: definition.stages.clone(),
            status: ExecutionStatus::Pending,
            input,
            output: None,
            error: None,
            stage_logs: Vec::new(),
            started_at: chrono::Utc::now(),
            completed_at: None,
            duration_ms: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// pending -> running
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(ExecutionStatus::Running)
    }

    /// running -> completed
    pub fn complete(
        &mut self,
        output: serde_json::Value,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(ExecutionStatus::Completed)?;
        self.output = Some(output);
        self.error = None;
        self.finish(at);
        Ok(())
    }

    /// pending|running -> failed
    pub fn fail(
        &mut self,
        error: ExecutionError,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(ExecutionStatus::Failed)?;
        self.output = None;
        self.error = Some(error);
        self.finish(at);
        Ok(())
    }

    fn transition(&mut self, next: ExecutionStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    fn finish(&mut self, at: chrono::DateTime<chrono::Utc>) {
        // Never before the creation timestamp, even with a skewed clock
        let at = at.max(self.started_at);
        self.completed_at = Some(at);
        self.duration_ms = Some((at - self.started_at).num_milliseconds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ExecutionRecord {
        let def = WorkflowDefinition::new("Docs", "document_automation", vec!["classify".into()]);
        ExecutionRecord::pending(&def, serde_json::json!({"file_content": "x"}))
    }

    #[test]
    fn test_pending_record_has_no_result() {
        let rec = record();
        assert_eq!(rec.status, ExecutionStatus::Pending);
        assert!(rec.output.is_none());
        assert!(rec.error.is_none());
        assert!(rec.completed_at.is_none());
        assert_eq!(rec.stages, vec!["classify".to_string()]);
    }

    #[test]
    fn test_complete_sets_output_and_duration() {
        let mut rec = record();
        rec.start().unwrap();
        let at = rec.started_at + chrono::Duration::milliseconds(1500);
        rec.complete(serde_json::json!({"ok": true}), at).unwrap();

        assert_eq!(rec.status, ExecutionStatus::Completed);
        assert!(rec.output.is_some());
        assert!(rec.error.is_none());
        assert_eq!(rec.completed_at, Some(at));
        assert_eq!(rec.duration_ms, Some(1500));
    }

    #[test]
    fn test_fail_sets_error_only() {
        let mut rec = record();
        rec.start().unwrap();
        rec.fail(ExecutionError::stage("classify", "boom"), chrono::Utc::now())
            .unwrap();

        assert_eq!(rec.status, ExecutionStatus::Failed);
        assert!(rec.output.is_none());
        assert_eq!(rec.error.as_ref().unwrap().stage.as_deref(), Some("classify"));
        assert!(rec.duration_ms.unwrap() >= 0);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut rec = record();
        rec.start().unwrap();
        rec.complete(serde_json::json!({}), chrono::Utc::now()).unwrap();

        assert!(rec.start().is_err());
        assert!(rec.fail(ExecutionError::internal("late"), chrono::Utc::now()).is_err());
        assert!(rec.complete(serde_json::json!({}), chrono::Utc::now()).is_err());
        assert_eq!(rec.status, ExecutionStatus::Completed);
        assert!(rec.error.is_none());
    }

    #[test]
    fn test_pending_cannot_complete_directly() {
        let mut rec = record();
        let err = rec.complete(serde_json::json!({}), chrono::Utc::now()).unwrap_err();
        assert_eq!(err.from, ExecutionStatus::Pending);
        assert_eq!(err.to, ExecutionStatus::Completed);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ExecutionStatus::Pending,
            ExecutionStatus::Running,
            ExecutionStatus::Completed,
            ExecutionStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ExecutionStatus>().unwrap(), status);
        }
        assert!("queued".parse::<ExecutionStatus>().is_err());
    }

    #[test]
    fn test_error_display_names_stage() {
        let err = ExecutionError::stage("extract", "upstream unavailable");
        assert_eq!(err.to_string(), "stage 'extract' failed: upstream unavailable");
    }
}
