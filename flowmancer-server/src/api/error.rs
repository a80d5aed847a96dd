//! API Error Handling
//!
//! Every error body is `{"error": message, "code": machine_code}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flowmancer_engine::{StoreError, TriggerError};

use crate::service::workflow_service::WorkflowError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    ValidationError(String),
    Trigger(TriggerError),
    StoreError(StoreError),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::ValidationError(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
            }
            ApiError::Trigger(TriggerError::Store(err)) => ApiError::StoreError(err).parts(),
            ApiError::Trigger(err) => {
                let status = match &err {
                    TriggerError::UnknownType(_) => StatusCode::NOT_FOUND,
                    TriggerError::Inactive(_) => StatusCode::CONFLICT,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, err.code(), err.to_string())
            }
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_error",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        ApiError::Trigger(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Record {} not found", id)),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::StoreError(other),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(id) => ApiError::NotFound(format!("Workflow {} not found", id)),
            WorkflowError::ValidationError(msg) => ApiError::ValidationError(msg),
            WorkflowError::Conflict(msg) => ApiError::Conflict(msg),
            WorkflowError::StoreError(err) => ApiError::StoreError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_error_status_codes() {
        let cases = [
            (TriggerError::UnknownType("x".into()), StatusCode::NOT_FOUND, "unknown_type"),
            (TriggerError::Inactive("x".into()), StatusCode::CONFLICT, "inactive"),
            (
                TriggerError::UnknownStage {
                    workflow_type: "x".into(),
                    stage: "y".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "unknown_stage",
            ),
            (
                TriggerError::Store(StoreError::Backend("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
            ),
        ];

        for (err, status, code) in cases {
            let (got_status, got_code, _) = ApiError::from(err).parts();
            assert_eq!(got_status, status);
            assert_eq!(got_code, code);
        }
    }
}
