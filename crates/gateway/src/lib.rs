//! HTTP API gateway for plandesk.
//!
//! Routes:
//! - `GET /`: liveness message
//! - `GET /health`: status and version
//! - `POST /ask`: answer a benefits question (two-stage pipeline)
//! - `POST /run`: recommend a plan from preferences and a plan list
//!
//! Built on Axum with HTTP tracing, a 1 MB body limit, and permissive CORS
//! for the browser front-end.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use plandesk_agent::{
    CompletionInvoker, ContextGatherer, EscalationController, PlanAdvisor, PromptAssembler,
};
use plandesk_config::AppConfig;
use plandesk_core::error::Error;
use plandesk_core::history::HistoryStore;
use plandesk_core::provider::Provider;
use plandesk_core::retrieval::Retriever;
use plandesk_retrieval::StaticRetriever;

/// Shared, immutable application state.
pub struct AppState {
    pub controller: EscalationController,
    pub advisor: PlanAdvisor,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the pipelines from already-built collaborators.
    pub fn from_parts(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        history: Arc<dyn HistoryStore>,
        retriever: Arc<dyn Retriever>,
    ) -> Result<Self, Error> {
        let prompts = Arc::new(PromptAssembler::from_config(&config.knowledge)?);
        let model = plandesk_providers::model_for(config);
        let invoker = CompletionInvoker::from_config(provider, model, config);

        info!(
            provider = %invoker.provider_name(),
            model = %invoker.model(),
            history = %history.name(),
            retriever = %retriever.name(),
            policy = ?config.history.on_unavailable,
            "Pipelines ready"
        );

        Ok(Self {
            controller: EscalationController::new(
                ContextGatherer::new(history, config.history.on_unavailable),
                prompts,
                invoker.clone(),
                retriever,
            ),
            advisor: PlanAdvisor::new(invoker),
        })
    }

    /// Build every collaborator from config.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let provider = plandesk_providers::build_from_config(config).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        let history = plandesk_history::build_from_config(config)
            .await
            .map_err(|e| Error::Config {
                message: e.to_string(),
            })?;
        Self::from_parts(config, provider, history, retriever_from_config(config))
    }
}

/// The configured search client, or an empty one when search is not set up.
pub fn retriever_from_config(config: &AppConfig) -> Arc<dyn Retriever> {
    match plandesk_retrieval::build_from_config(config) {
        Ok(retriever) => retriever,
        Err(e) => {
            warn!(error = %e, "Knowledge-base search disabled; stage 2 will see no documents");
            Arc::new(StaticRetriever::default())
        }
    }
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(api::root_handler))
        .route("/health", get(api::health_handler))
        .route("/ask", post(api::ask_handler))
        .route("/run", post(api::run_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve `state` on the configured address until the process is stopped.
pub async fn serve(config: &AppConfig, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(Arc::new(state));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build state from config and serve it.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_config(&config).await?;
    serve(&config, state).await
}
