//! HTTP/JSON backend for the idle RPG.
//!
//! All endpoints live under `/api` and answer with the
//! [`ApiResponse`](idle_core::api::ApiResponse) envelope. Protected routes
//! expect `Authorization: Bearer <token>` as issued by register and login.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod validation;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the router for `state`.
pub fn app(state: AppState) -> Router {
    let origin = match &state.config.cors_origin {
        Some(origin) => AllowOrigin::exact(origin.clone()),
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(origin);

    Router::new()
        .nest("/api", routes::api_routes())
        .fallback(routes::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
