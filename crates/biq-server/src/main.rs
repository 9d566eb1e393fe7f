//! BIQ server: natural-language business questions over HTTP
//!
//! Accepts a question, acquires a SQL query for it (synthesized or
//! selected from the catalog), executes it against DuckDB, derives an
//! AI-assisted narrative and renders a chart, and returns the composite
//! answer as JSON.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use biq_charts::ChartEngine;
use biq_core::{PipelineError, PipelineResponse, QueryCatalog, SchemaDescriptor};
use biq_duck::QueryExecutor;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod acquire;
mod config;
mod insight;
mod llm;
mod logging;
mod pipeline;

use config::Config;
use llm::OpenAiReasoner;
use pipeline::{AgentMode, Pipeline};

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
    /// Optional per-request mode override: "autonomous" or "catalog".
    #[serde(default)]
    mode: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables and configuration
    dotenvy::dotenv().ok();
    let config = match Config::load("config.yaml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config.yaml not loaded ({e}), using defaults");
            Config::default()
        }
    };
    config.apply_logging_env();
    logging::init();

    // Reasoning service client
    let api_key = Config::get_openai_api_key()?;
    let openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
    let client = async_openai::Client::with_config(openai_config);
    let reasoner = Arc::new(OpenAiReasoner::new(
        client,
        config.pipeline.model.clone(),
        Duration::from_secs(config.pipeline.timeout_secs),
    ));
    info!(model = %config.pipeline.model, "reasoning client ready");

    // Read-only shared state: schema descriptor and query catalog
    let schema = Arc::new(SchemaDescriptor::ecommerce());
    let catalog = Arc::new(QueryCatalog::from_sources(&config.catalog_sources())?);
    info!(queries = catalog.len(), "query catalog loaded");

    let mode = AgentMode::parse(&config.pipeline.mode).unwrap_or(AgentMode::Autonomous);
    let pipeline = Arc::new(Pipeline::new(
        reasoner,
        schema,
        catalog,
        QueryExecutor::open(&config.pipeline.database),
        ChartEngine::new(&config.pipeline.charts_dir),
        mode,
    ));

    let app = Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .with_state(AppState { pipeline });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(%addr, ?mode, database = %config.pipeline.database, "starting BIQ server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<PipelineResponse>, (StatusCode, String)> {
    if request.question.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "question must not be empty".to_string()));
    }

    let response = match request.mode.as_deref().and_then(AgentMode::parse) {
        Some(mode) => state.pipeline.ask_with_mode(&request.question, mode).await,
        None => state.pipeline.ask(&request.question).await,
    };

    match response {
        Ok(response) => Ok(Json(response)),
        Err(e @ PipelineError::Acquisition(_)) => {
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(e @ PipelineError::Execution(_)) => {
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}
