//! API Module
//!
//! HTTP API layer of the server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod execution;
pub mod health;
pub mod webhook;
pub mod workflow;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use flowmancer_engine::{Orchestrator, Settings};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub settings: Arc<Settings>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Workflow endpoints
        .route(
            "/api/workflows",
            get(workflow::list_workflows).post(workflow::create_workflow),
        )
        .route(
            "/api/workflows/{id}",
            get(workflow::get_workflow)
                .put(workflow::update_workflow)
                .delete(workflow::delete_workflow),
        )
        .route(
            "/api/workflows/{id}/executions",
            get(workflow::list_workflow_executions),
        )
        // Execution endpoints
        .route(
            "/api/executions",
            get(execution::list_executions).post(execution::trigger_execution),
        )
        .route("/api/executions/batch", post(execution::trigger_batch))
        .route("/api/executions/{id}", get(execution::get_execution))
        // Webhook intake
        .route("/api/webhooks/{source}", post(webhook::receive_webhook))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// CORS layer for the configured origins; `*` allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use flowmancer_core::domain::context::{Context, StageOutput};
    use flowmancer_engine::stage::FnStage;
    use flowmancer_engine::{
        DefinitionStore, Dispatcher, ExecutionStore, InMemoryDefinitionStore,
        InMemoryExecutionStore, NotifierFactory, Notifier, Registry, StageCatalog, StoreError,
        StoreResult,
    };
    use flowmancer_core::domain::execution::{ExecutionRecord, ExecutionStatus};
    use flowmancer_core::domain::workflow::{IntegrationTarget, WorkflowDefinition};
    use flowmancer_core::dto::workflow::Page;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct NoNotifiers;

    impl NotifierFactory for NoNotifiers {
        fn build(&self, _target: &IntegrationTarget) -> Option<Arc<dyn Notifier>> {
            None
        }
    }

    /// Execution store whose point reads always fail
    struct UnreadableStore(InMemoryExecutionStore);

    #[async_trait::async_trait]
    impl ExecutionStore for UnreadableStore {
        async fn create(&self, record: &ExecutionRecord) -> StoreResult<()> {
            self.0.create(record).await
        }

        async fn get(&self, _id: Uuid) -> StoreResult<Option<ExecutionRecord>> {
            Err(StoreError::Backend("read replica down".into()))
        }

        async fn update(&self, record: &ExecutionRecord) -> StoreResult<()> {
            self.0.update(record).await
        }

        async fn list_by_workflow(&self, workflow_id: Uuid, page: Page) -> StoreResult<Vec<ExecutionRecord>> {
            self.0.list_by_workflow(workflow_id, page).await
        }

        async fn list_by_type(&self, workflow_type: &str, page: Page) -> StoreResult<Vec<ExecutionRecord>> {
            self.0.list_by_type(workflow_type, page).await
        }

        async fn list_by_status(&self, statuses: &[ExecutionStatus]) -> StoreResult<Vec<ExecutionRecord>> {
            self.0.list_by_status(statuses).await
        }
    }

    async fn app() -> Router {
        app_with(Arc::new(InMemoryExecutionStore::new())).await
    }

    async fn app_with(executions: Arc<dyn ExecutionStore>) -> Router {
        let mut catalog = StageCatalog::new();
        catalog.register(FnStage::new("shout", |ctx: &Context| {
            let text = ctx.get("text").and_then(Value::as_str).ok_or("text missing")?;
            let mut out = StageOutput::new();
            out.insert("shouted".into(), json!(text.to_uppercase()));
            Ok(out)
        }));

        let definitions = Arc::new(InMemoryDefinitionStore::new());
        definitions
            .create(WorkflowDefinition::new("Shout", "shout", vec!["shout".into()]))
            .await
            .unwrap();
        definitions
            .create(WorkflowDefinition::new("Off", "off", vec!["shout".into()]).with_active(false))
            .await
            .unwrap();

        let orchestrator = Orchestrator::new(
            Registry::new(catalog, definitions),
            executions,
            Dispatcher::new(Arc::new(NoNotifiers)),
            4,
        );

        create_router(AppState {
            orchestrator,
            settings: Arc::new(Settings::default()),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn wait_terminal(app: &Router, id: &str) -> Value {
        for _ in 0..200 {
            let (_, record) = send(app, "GET", &format!("/api/executions/{}", id), None).await;
            if record["status"] == "completed" || record["status"] == "failed" {
                return record;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("execution {} never finished", id);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["app"], "FlowMancer");
    }

    #[tokio::test]
    async fn test_trigger_and_poll() {
        let app = app().await;
        let (status, record) = send(
            &app,
            "POST",
            "/api/executions",
            Some(json!({"workflow_type": "shout", "input": {"text": "hi"}})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = record["id"].as_str().unwrap().to_string();

        let done = wait_terminal(&app, &id).await;
        assert_eq!(done["status"], "completed");
        assert_eq!(done["output"], json!({"shouted": "HI"}));
        assert!(done["error"].is_null());

        let (status, list) = send(&app, "GET", "/api/executions?workflow_type=shout&limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_trigger_returns_record_without_reading_it_back() {
        let inner = InMemoryExecutionStore::new();
        let app = app_with(Arc::new(UnreadableStore(inner.clone()))).await;

        let (status, record) = send(
            &app,
            "POST",
            "/api/executions",
            Some(json!({"workflow_type": "shout", "input": {"text": "hi"}})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(record["status"], "pending");
        assert_eq!(record["workflow_type"], "shout");

        let stored = inner.list_by_type("shout", Page::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(record["id"], json!(stored[0].id));
    }

    #[tokio::test]
    async fn test_stage_failure_is_recorded() {
        let app = app().await;
        let (_, record) = send(
            &app,
            "POST",
            "/api/executions",
            Some(json!({"workflow_type": "shout", "input": {}})),
        )
        .await;

        let done = wait_terminal(&app, record["id"].as_str().unwrap()).await;
        assert_eq!(done["status"], "failed");
        assert_eq!(done["error"]["stage"], "shout");
        assert_eq!(done["error"]["message"], "text missing");
        assert!(done["output"].is_null());
    }

    #[tokio::test]
    async fn test_trigger_preconditions() {
        let app = app().await;

        let (status, body) = send(&app, "POST", "/api/executions", Some(json!({"workflow_type": "nope"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "unknown_type");

        let (status, body) = send(&app, "POST", "/api/executions", Some(json!({"workflow_type": "off"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "inactive");
    }

    #[tokio::test]
    async fn test_batch() {
        let app = app().await;
        let (status, summary) = send(
            &app,
            "POST",
            "/api/executions/batch",
            Some(json!({"workflow_type": "shout", "inputs": [{"text": "a"}, {"text": "b"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total"], 2);
        assert_eq!(summary["succeeded"], 2);
        assert_eq!(summary["failed"], 0);
        assert_eq!(summary["outcomes"][1]["index"], 1);
    }

    #[tokio::test]
    async fn test_missing_execution_is_404() {
        let app = app().await;
        let uri = format!("/api/executions/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn test_workflow_crud() {
        let app = app().await;
        let (status, created) = send(
            &app,
            "POST",
            "/api/workflows",
            Some(json!({
                "name": "Shout again",
                "description": null,
                "workflow_type": "shout_again",
                "stages": ["shout"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            "/api/workflows",
            Some(json!({"name": "Bad", "workflow_type": "bad", "stages": ["missing"]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/workflows/{}", id),
            Some(json!({"active": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["active"], false);

        let (_, list) = send(&app, "GET", "/api/workflows?skip=0&limit=10", None).await;
        assert_eq!(list.as_array().unwrap().len(), 3);

        let (status, _) = send(&app, "DELETE", &format!("/api/workflows/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/api/workflows/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhooks() {
        let app = app().await;

        let (status, ack) = send(
            &app,
            "POST",
            "/api/webhooks/generic",
            Some(json!({"event": "trigger.shout", "data": {"text": "hook"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["status"], "triggered");
        let done = wait_terminal(&app, ack["execution_id"].as_str().unwrap()).await;
        assert_eq!(done["output"], json!({"shouted": "HOOK"}));

        let (_, ack) = send(
            &app,
            "POST",
            "/api/webhooks/zapier",
            Some(json!({"workflow_type": "shout", "text": "zap"})),
        )
        .await;
        assert_eq!(ack["status"], "triggered");

        let (_, ack) = send(&app, "POST", "/api/webhooks/n8n", Some(json!({"event": "ping"}))).await;
        assert_eq!(ack["status"], "received");
        assert!(ack.get("execution_id").is_none());

        let (status, _) = send(&app, "POST", "/api/webhooks/slack", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            "POST",
            "/api/webhooks/generic",
            Some(json!({"event": "trigger.off", "data": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "inactive");
    }

    #[test]
    fn test_cors_layer_accepts_wildcard_and_lists() {
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["http://localhost:3000".to_string()]);
    }
}
