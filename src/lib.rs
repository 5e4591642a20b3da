pub mod auth;
pub mod cipher;
pub mod config;
pub mod error;
pub mod file_store;
pub mod gesture;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod util;

use auth::AuthGate;
use axum::{
    routing::{get, post},
    Router,
};
use repository::SecretRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn SecretRepository>,
    pub gate: AuthGate,
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth", post(handlers::auth::authenticate))
        .route(
            "/api/secrets",
            get(handlers::secrets::list)
                .post(handlers::secrets::create)
                .delete(handlers::secrets::delete),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Build the full application router (used by main and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api_routes())
        .merge(health_routes())
        .with_state(state)
}
