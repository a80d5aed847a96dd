use std::sync::Arc;

use anyhow::Context;
use flowmancer_engine::{Orchestrator, Settings};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;

use config::ServerConfig;
use repository::{PgDefinitionStore, PgExecutionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting FlowMancer server...");

    let settings = Settings::from_env().context("Failed to load engine settings")?;
    settings.validate().context("Invalid engine settings")?;
    let settings = Arc::new(settings);
    let server = ServerConfig::from_env().context("Failed to load server config")?;

    if settings.llm_api_key.is_empty() {
        tracing::warn!("LLM_API_KEY is not set, prompt stages will fail");
    }
    if !settings.n8n_configured() {
        tracing::info!("n8n is not configured, n8n integrations will be skipped");
    }

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&server.database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let orchestrator = Orchestrator::with_builtin_stages(
        Arc::clone(&settings),
        Arc::new(PgDefinitionStore::new(pool.clone())),
        Arc::new(PgExecutionStore::new(pool)),
    )?;

    // Runs from a previous process can never finish
    let recovered = orchestrator
        .recover_interrupted()
        .await
        .context("Failed to recover interrupted executions")?;
    if recovered > 0 {
        tracing::warn!("Marked {} interrupted execution(s) as failed", recovered);
    }

    if server.seed_defaults {
        let seeded = service::workflow_service::seed_default_workflows(&orchestrator)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed default workflows: {:?}", e))?;
        tracing::info!("Seeded {} default workflow(s)", seeded);
    }

    let app = api::create_router(api::AppState {
        orchestrator,
        settings,
    })
    .layer(api::cors_layer(&server.cors_origins));

    tracing::info!("Listening on {}", server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "flowmancer_server=debug,flowmancer_engine=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
