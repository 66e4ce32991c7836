pub mod generate;

use axum::extract::DefaultBodyLimit;
use axum::{routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::services::qr_service::QrService;
use generate::generate_qr;

/// State yang dibagikan ke handler. Immutable, di-clone per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: QrService,
    pub max_size: u32,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            service: QrService::with_options(config.service_options()),
            max_size: config.max_size,
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate_qr))
        .with_state(state)
}

/// Router lengkap dengan layer (body limit, CORS, tracing).
pub fn app(config: &ServerConfig) -> Router {
    routes(AppState::from_config(config))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}
