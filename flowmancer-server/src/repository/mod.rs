//! Repository Module
//!
//! PostgreSQL implementations of the engine's store traits.

pub mod execution;
pub mod workflow;

pub use execution::PgExecutionStore;
pub use workflow::PgDefinitionStore;

use flowmancer_engine::StoreError;

/// Maps sqlx failures onto store errors; unique violations become conflicts
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Backend(err.to_string())
}

pub(crate) fn offset(page: flowmancer_core::dto::workflow::Page) -> (i64, i64) {
    let skip = i64::try_from(page.skip).unwrap_or(i64::MAX);
    let limit = i64::try_from(page.limit).unwrap_or(i64::MAX);
    (skip, limit)
}
