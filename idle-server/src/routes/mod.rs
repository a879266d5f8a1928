//! Route table.

pub mod characters;
pub mod game;
pub mod users;

use crate::error::ApiError;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Json, Router};
use idle_core::api::{ApiResponse, HealthStatus};

/// Every endpoint, relative to `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route(
            "/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/characters", post(characters::create).get(characters::list))
        .route(
            "/characters/:id",
            get(characters::get)
                .put(characters::update)
                .delete(characters::delete),
        )
        .route("/game/:character_id/state", get(game::get_state))
        .route("/game/:character_id/action", post(game::perform_action))
}

async fn health() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok(HealthStatus::ok(), "Server is running"))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
