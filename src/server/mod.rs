pub mod handlers;
pub mod types;

use crate::{
    Error, Result,
    config::{Config, ServerConfig},
    model::{Gpt2Generator, TextGenerator},
};
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

pub use handlers::AppState;

pub const AI_QUERY_ROUTE: &str = "/api/ai-query";

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route(
            AI_QUERY_ROUTE,
            post(handlers::ai_query).options(handlers::preflight),
        )
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when no allow-list is configured.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| Error::config(format!("invalid CORS origin '{origin}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}

pub async fn run(config: Config) -> Result<()> {
    let cors = cors_layer(&config.server)?;

    // The listener is bound only after the model is loaded.
    let model_config = config.model.clone();
    let generation = config.generation.clone();
    let generator = tokio::task::spawn_blocking(move || {
        Gpt2Generator::load(&model_config, &generation)
    })
    .await
    .map_err(|e| Error::internal(format!("model loading task failed: {e}")))?
    .inspect_err(|e| error!("Error loading model and tokenizer: {}", e))?;

    let app_state = AppState {
        generator: Arc::new(generator) as Arc<dyn TextGenerator>,
        generation: Arc::new(config.generation.clone()),
    };

    let app = router(app_state, cors);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
