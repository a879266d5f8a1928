//! Minimal async client for the idle RPG HTTP API.
//!
//! Covers every endpoint the server exposes:
//! - Registration, login and profile management
//! - Character roster CRUD
//! - Game state and actions
//!
//! The client remembers the token returned by [`IdleClient::register`] or
//! [`IdleClient::login`] and sends it on protected requests.

use idle_core::api::{
    ApiResponse, AuthPayload, CreateCharacterRequest, HealthStatus, LoginRequest,
    RegisterRequest, UpdateCharacterRequest, UpdateProfileRequest,
};
use idle_core::{Action, ActionOutcome, Character, CharacterId, GameState, UserProfile};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

/// Errors that can occur when using the client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl Error {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Idle RPG API client.
#[derive(Clone)]
pub struct IdleClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl IdleClient {
    /// Create a client for the API rooted at `base_url` (e.g.
    /// `http://localhost:3001/api`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a client from `IDLE_API_URL`, falling back to the local default.
    pub fn from_env() -> Result<Self, Error> {
        let base_url =
            std::env::var("IDLE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Use an existing token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn health(&self) -> Result<HealthStatus, Error> {
        self.send(self.request(Method::GET, "/health")).await
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, Error> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthPayload = self
            .send_json(Method::POST, "/users/register", &body)
            .await?;
        self.token = Some(auth.token);
        Ok(auth.user)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, Error> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthPayload = self.send_json(Method::POST, "/users/login", &body).await?;
        self.token = Some(auth.token);
        Ok(auth.user)
    }

    pub async fn profile(&self) -> Result<UserProfile, Error> {
        self.send(self.authed(Method::GET, "/users/profile")?).await
    }

    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<UserProfile, Error> {
        self.send(self.authed(Method::PUT, "/users/profile")?.json(update))
            .await
    }

    // ========================================================================
    // Characters
    // ========================================================================

    pub async fn characters(&self) -> Result<Vec<Character>, Error> {
        self.send(self.authed(Method::GET, "/characters")?).await
    }

    pub async fn create_character(&self, name: &str, class: &str) -> Result<Character, Error> {
        let body = CreateCharacterRequest {
            name: name.to_string(),
            class: class.to_string(),
        };
        self.send(self.authed(Method::POST, "/characters")?.json(&body))
            .await
    }

    pub async fn character(&self, id: CharacterId) -> Result<Character, Error> {
        self.send(self.authed(Method::GET, &format!("/characters/{id}"))?)
            .await
    }

    pub async fn update_character(
        &self,
        id: CharacterId,
        update: &UpdateCharacterRequest,
    ) -> Result<Character, Error> {
        self.send(
            self.authed(Method::PUT, &format!("/characters/{id}"))?
                .json(update),
        )
        .await
    }

    pub async fn delete_character(&self, id: CharacterId) -> Result<(), Error> {
        let response = self
            .authed(Method::DELETE, &format!("/characters/{id}"))?
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Self::envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    // ========================================================================
    // Game
    // ========================================================================

    pub async fn game_state(&self, character_id: CharacterId) -> Result<GameState, Error> {
        self.send(self.authed(Method::GET, &format!("/game/{character_id}/state"))?)
            .await
    }

    pub async fn perform(
        &self,
        character_id: CharacterId,
        action: &Action,
    ) -> Result<ActionOutcome, Error> {
        self.send(
            self.authed(Method::POST, &format!("/game/{character_id}/action"))?
                .json(&action.to_request()),
        )
        .await
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        let token = self.token.as_deref().ok_or(Error::NotAuthenticated)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.send(self.request(method, path).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Self::envelope::<T>(response)
            .await?
            .data
            .ok_or_else(|| Error::Parse("response has no data".to_string()))
    }

    /// Unwrap the envelope, turning failures into [`Error::Api`].
    async fn envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>, Error> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or(text);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::Parse(e.to_string()))
    }
}
