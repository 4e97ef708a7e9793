//! Router assembly

use crate::AppState;
use axum::{routing::get, Router};

use super::health::{handle_health, handle_liveness};

pub fn create_routes(health_path: &str, liveness_path: &str) -> Router<AppState> {
    Router::new()
        .route(health_path, get(handle_health))
        .route(liveness_path, get(handle_liveness))
}
