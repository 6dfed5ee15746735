//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: pipeline wiring (store, broker, simulator, bridge)
//! - `routes/`: HTTP routes + handlers (one file per surface)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/analysis", routes::analysis::router())
        .nest("/api/registration", routes::registration::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
