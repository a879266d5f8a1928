//! Registration, login and profile endpoints.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::Validated;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use idle_core::api::{
    ApiResponse, AuthPayload, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use idle_core::UserProfile;

pub async fn register(
    State(state): State<AppState>,
    Validated(request): Validated<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthPayload>>), ApiError> {
    let user = state
        .accounts
        .register(&request.username, &request.email, &request.password)
        .await?;
    let token = state.tokens.issue(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            AuthPayload { user, token },
            "User registered successfully",
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Validated(request): Validated<LoginRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let user = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    let token = state.tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(ApiResponse::ok(
        AuthPayload { user, token },
        "Login successful",
    )))
}

pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = state.accounts.profile(auth.id()).await?;
    Ok(Json(ApiResponse::ok(
        profile,
        "Profile retrieved successfully",
    )))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Validated(request): Validated<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = state
        .accounts
        .update_profile(auth.id(), request.into())
        .await?;
    Ok(Json(ApiResponse::ok(profile, "Profile updated successfully")))
}
