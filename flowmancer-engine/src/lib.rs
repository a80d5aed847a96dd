//! FlowMancer Engine
//!
//! The workflow execution engine: resolves a workflow type to its ordered
//! stages, records each run in an execution store, drives the run on its own
//! task and notifies integration targets once the run is terminal.
//!
//! Architecture:
//! - Configuration: read-only [`Settings`] built once at startup
//! - Stages: opaque `apply(context)` units registered by name
//! - Registry: workflow type -> definition + concrete stage list
//! - Stores: trait-based persistence for definitions and execution records
//! - Dispatch: best-effort fan-out to integration targets
//! - Orchestrator: trigger, batch trigger, query and the run state machine

pub mod config;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod stage;
pub mod store;

pub use config::Settings;
pub use dispatch::{DispatchReport, Dispatcher, HttpNotifierFactory, Notifier, NotifierFactory, NotifyError};
pub use error::{StoreError, StoreResult, TriggerError};
pub use orchestrator::Orchestrator;
pub use registry::{Registry, ResolvedPipeline, StageCatalog};
pub use stage::{Stage, StageError};
pub use store::{DefinitionStore, ExecutionStore, InMemoryDefinitionStore, InMemoryExecutionStore};
