//! Game state and action endpoints.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::Validated;
use axum::extract::{Path, State};
use axum::Json;
use idle_core::api::ApiResponse;
use idle_core::{ActionOutcome, ActionRequest, CharacterId, GameState};

fn character_id(raw: &str) -> Result<CharacterId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("Game state not found".to_string()))
}

pub async fn get_state(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(character_id_raw): Path<String>,
) -> Result<Json<ApiResponse<GameState>>, ApiError> {
    let id = character_id(&character_id_raw)?;
    let seed = state.roster.get(auth.id(), id).await.ok();
    let game_state = state.game.state(auth.id(), id, seed).await?;
    Ok(Json(ApiResponse::ok(
        game_state,
        "Game state retrieved successfully",
    )))
}

pub async fn perform_action(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(character_id_raw): Path<String>,
    Validated(request): Validated<ActionRequest>,
) -> Result<Json<ApiResponse<ActionOutcome>>, ApiError> {
    let id = character_id(&character_id_raw)?;
    let name = request.action.clone();
    let outcome = state.game.dispatch(auth.id(), id, request).await?;
    tracing::debug!(character_id = %id, action = %name, "performed action");
    Ok(Json(ApiResponse::ok(
        outcome,
        format!("Action '{name}' performed successfully"),
    )))
}
