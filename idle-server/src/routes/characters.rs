//! Character roster endpoints.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::Validated;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use idle_core::api::{ApiResponse, CreateCharacterRequest, UpdateCharacterRequest};
use idle_core::{Character, CharacterClass, CharacterId};

/// Ids that do not parse cannot name a character.
fn character_id(raw: &str) -> Result<CharacterId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("Character not found".to_string()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Validated(request): Validated<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Character>>), ApiError> {
    let class: CharacterClass = request
        .class
        .parse()
        .map_err(ApiError::BadRequest)?;
    let character = state.roster.create(auth.id(), &request.name, class).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(character, "Character created successfully")),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Character>>>, ApiError> {
    let characters = state.roster.list(auth.id()).await?;
    Ok(Json(ApiResponse::ok(
        characters,
        "Characters retrieved successfully",
    )))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Character>>, ApiError> {
    let character = state.roster.get(auth.id(), character_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(
        character,
        "Character retrieved successfully",
    )))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Validated(request): Validated<UpdateCharacterRequest>,
) -> Result<Json<ApiResponse<Character>>, ApiError> {
    let character = state
        .roster
        .update(auth.id(), character_id(&id)?, request.into())
        .await?;
    Ok(Json(ApiResponse::ok(
        character,
        "Character updated successfully",
    )))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.roster.delete(auth.id(), character_id(&id)?).await?;
    Ok(Json(ApiResponse::done("Character deleted successfully")))
}
