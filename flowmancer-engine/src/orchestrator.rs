//! Orchestrator
//!
//! Accepts triggers, creates execution records and drives each run on its
//! own task:
//!
//! 1. Resolve the workflow type (precondition failures create no record)
//! 2. Persist the record as `pending` and hand its id back
//! 3. On the run task: wait for a concurrency permit, persist `running`
//! 4. Apply the stages in order, stopping at the first failure
//! 5. Persist the terminal state, then notify integration targets
//!
//! Only the run task writes a record after creation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use flowmancer_core::domain::context::{Context, StageOutput};
use flowmancer_core::domain::execution::{
    ExecutionError, ExecutionRecord, ExecutionStatus, StageLog, StageStatus,
};
use flowmancer_core::dto::execution::{BatchOutcome, BatchSummary};
use flowmancer_core::dto::workflow::Page;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::dispatch::{Dispatcher, HttpNotifierFactory};
use crate::error::{StoreResult, TriggerError};
use crate::registry::{Registry, ResolvedPipeline};
use crate::stage::builtin;
use crate::store::{DefinitionStore, ExecutionStore};

#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    executions: Arc<dyn ExecutionStore>,
    dispatcher: Dispatcher,
    permits: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(
        registry: Registry,
        executions: Arc<dyn ExecutionStore>,
        dispatcher: Dispatcher,
        max_concurrent_runs: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                executions,
                dispatcher,
                permits: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
            }),
        }
    }

    /// Wires the built-in stage catalog and HTTP notifiers around the given stores
    pub fn with_builtin_stages(
        settings: Arc<Settings>,
        definitions: Arc<dyn DefinitionStore>,
        executions: Arc<dyn ExecutionStore>,
    ) -> anyhow::Result<Self> {
        let registry = Registry::new(builtin::catalog(&settings), definitions);
        let factory = HttpNotifierFactory::new(Arc::clone(&settings))?;
        let dispatcher = Dispatcher::new(Arc::new(factory));
        Ok(Self::new(
            registry,
            executions,
            dispatcher,
            settings.max_concurrent_runs,
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn executions(&self) -> &Arc<dyn ExecutionStore> {
        &self.inner.executions
    }

    // ========================================================================
    // Trigger
    // ========================================================================

    /// Starts a run and returns its execution id without waiting for it
    pub async fn trigger(&self, workflow_type: &str, input: Value) -> Result<Uuid, TriggerError> {
        let (record, _handle) = self.start(workflow_type, input).await?;
        Ok(record.id)
    }

    /// Like [`trigger`](Self::trigger), returning the record as it was created
    ///
    /// The record is the `pending` snapshot; the run may already be further along.
    pub async fn submit(&self, workflow_type: &str, input: Value) -> Result<ExecutionRecord, TriggerError> {
        let (record, _handle) = self.start(workflow_type, input).await?;
        Ok(record)
    }

    /// Like [`trigger`](Self::trigger), also returning the run task
    ///
    /// The handle resolves to the run's final record once integrations have
    /// been notified.
    pub async fn trigger_with_handle(
        &self,
        workflow_type: &str,
        input: Value,
    ) -> Result<(Uuid, JoinHandle<ExecutionRecord>), TriggerError> {
        let (record, handle) = self.start(workflow_type, input).await?;
        Ok((record.id, handle))
    }

    async fn start(
        &self,
        workflow_type: &str,
        input: Value,
    ) -> Result<(ExecutionRecord, JoinHandle<ExecutionRecord>), TriggerError> {
        let pipeline = self.inner.registry.resolve(workflow_type).await?;

        let record = ExecutionRecord::pending(&pipeline.definition, input);
        self.inner.executions.create(&record).await?;

        info!(execution_id = %record.id, workflow_type = %workflow_type, "Execution accepted");

        let this = self.clone();
        let pending = record.clone();
        let handle = tokio::spawn(async move { this.run(pipeline, record).await });

        Ok((pending, handle))
    }

    /// Triggers one run per input; each entry is accepted or rejected on its own
    pub async fn trigger_batch(&self, workflow_type: &str, inputs: Vec<Value>) -> BatchSummary {
        let mut outcomes = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.into_iter().enumerate() {
            let outcome = match self.trigger(workflow_type, input).await {
                Ok(execution_id) => BatchOutcome::Accepted {
                    index,
                    execution_id,
                },
                Err(e) => {
                    if e.is_precondition() {
                        debug!(workflow_type = %workflow_type, index, error = %e, "Batch entry rejected");
                    } else {
                        warn!(workflow_type = %workflow_type, index, error = %e, "Batch entry failed");
                    }
                    BatchOutcome::Rejected {
                        index,
                        code: e.code().to_string(),
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let summary = BatchSummary::from_outcomes(outcomes);
        info!(
            workflow_type = %workflow_type,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch triggered"
        );
        summary
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_execution(&self, id: Uuid) -> StoreResult<Option<ExecutionRecord>> {
        self.inner.executions.get(id).await
    }

    /// Executions of a workflow type, newest first
    pub async fn list_executions(
        &self,
        workflow_type: &str,
        page: Page,
    ) -> StoreResult<Vec<ExecutionRecord>> {
        self.inner.executions.list_by_type(workflow_type, page).await
    }

    /// Fails every record left `pending` or `running` by a previous process
    ///
    /// Must run before any new trigger is accepted.
    pub async fn recover_interrupted(&self) -> StoreResult<usize> {
        let stale = self
            .inner
            .executions
            .list_by_status(&[ExecutionStatus::Pending, ExecutionStatus::Running])
            .await?;

        let mut recovered = 0;
        for mut record in stale {
            if record.fail(ExecutionError::interrupted(), Utc::now()).is_err() {
                continue;
            }
            self.inner.executions.update(&record).await?;
            warn!(execution_id = %record.id, workflow_type = %record.workflow_type, "Marked interrupted execution as failed");
            recovered += 1;
        }

        if recovered > 0 {
            info!("Recovered {} interrupted execution(s)", recovered);
        }
        Ok(recovered)
    }

    // ========================================================================
    // Run
    // ========================================================================

    async fn run(self, pipeline: ResolvedPipeline, mut record: ExecutionRecord) -> ExecutionRecord {
        // The semaphore is never closed
        let _permit = self.inner.permits.clone().acquire_owned().await.ok();

        if let Err(e) = record.start() {
            error!(execution_id = %record.id, error = %e, "Execution cannot start");
            return record;
        }
        let running = record.clone();

        let outcome = match self.inner.executions.update(&record).await {
            Ok(()) => {
                info!(execution_id = %record.id, workflow_type = %record.workflow_type, "Execution running");
                self.run_stages(&pipeline, &mut record).await
            }
            Err(e) => Err(ExecutionError::internal(format!(
                "failed to persist running state: {}",
                e
            ))),
        };

        let finished_at = Utc::now();
        let transition = match outcome {
            Ok(output) => record.complete(output, finished_at),
            Err(err) => record.fail(err, finished_at),
        };
        if let Err(e) = transition {
            error!(execution_id = %record.id, error = %e, "Execution cannot finish");
            return record;
        }

        match self.inner.executions.update(&record).await {
            Ok(()) => {
                info!(
                    execution_id = %record.id,
                    status = %record.status,
                    duration_ms = record.duration_ms.unwrap_or_default(),
                    "Execution finished"
                );
            }
            Err(e) => {
                warn!(execution_id = %record.id, error = %e, "Failed to persist final state, marking execution failed");
                let mut fallback = running;
                fallback.stage_logs = record.stage_logs.clone();
                let reason = ExecutionError::internal(format!("failed to persist final state: {}", e));
                if fallback.fail(reason, Utc::now()).is_err() {
                    return record;
                }
                if let Err(e) = self.inner.executions.update(&fallback).await {
                    error!(execution_id = %record.id, error = %e, "Execution is stuck in its last persisted state");
                    return record;
                }
                record = fallback;
            }
        }

        let report = self
            .inner
            .dispatcher
            .dispatch(&record, &pipeline.definition.integrations)
            .await;
        if report.failed > 0 {
            debug!(execution_id = %record.id, ?report, "Dispatch finished with failures");
        }

        record
    }

    /// Applies the stages in order; the output is the union of stage outputs
    async fn run_stages(
        &self,
        pipeline: &ResolvedPipeline,
        record: &mut ExecutionRecord,
    ) -> Result<Value, ExecutionError> {
        let mut context = Context::seed(&record.input, &pipeline.definition.config);
        let mut output = StageOutput::new();

        for stage in &pipeline.stages {
            let name = stage.name().to_string();
            let started_at = Utc::now();
            debug!(execution_id = %record.id, stage = %name, "Applying stage");

            let result = AssertUnwindSafe(stage.apply(&context)).catch_unwind().await;
            let finished_at = Utc::now();

            let failure = match result {
                Ok(Ok(fields)) => {
                    record.stage_logs.push(StageLog {
                        stage: name,
                        status: StageStatus::Succeeded,
                        started_at,
                        finished_at,
                        error: None,
                    });
                    for (key, value) in &fields {
                        output.insert(key.clone(), value.clone());
                    }
                    context = context.merge(fields);
                    continue;
                }
                Ok(Err(e)) => ExecutionError::stage(&name, e.message),
                Err(panic) => ExecutionError {
                    stage: Some(name.clone()),
                    ..ExecutionError::internal(format!("stage panicked: {}", panic_message(&*panic)))
                },
            };

            warn!(execution_id = %record.id, stage = %name, error = %failure.message, "Stage failed");
            record.stage_logs.push(StageLog {
                stage: name,
                status: StageStatus::Failed,
                started_at,
                finished_at,
                error: Some(failure.message.clone()),
            });
            return Err(failure);
        }

        Ok(Value::Object(output))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
