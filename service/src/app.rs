use axum::{
    routing::{get, post},
    Router,
};
use booking_model::Predictor;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ErrorMode;
use crate::handler::{health, predict};

/// Shared, read-only request state. The predictor is loaded once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub error_mode: ErrorMode,
}

impl AppState {
    pub fn new(predictor: Predictor, error_mode: ErrorMode) -> Self {
        Self {
            predictor: Arc::new(predictor),
            error_mode,
        }
    }
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
