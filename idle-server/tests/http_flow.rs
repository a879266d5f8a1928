//! Drives a live server on an ephemeral port through `idle-client`.
//!
//! These tests verify the HTTP surface end to end:
//! - Registration, login and profile updates
//! - Token checks on protected routes
//! - Character roster CRUD
//! - Game state and actions

use idle_client::{Error, IdleClient};
use idle_core::api::{UpdateCharacterRequest, UpdateProfileRequest};
use idle_core::{Action, ActionOutcome, CharacterId, StatAllocation, Stat};
use idle_server::{app, AppState, ServerConfig};
use std::net::{IpAddr, Ipv4Addr};
use tokio::net::TcpListener;

const PASSWORD: &str = "Secret1!";

/// Start a server and return the API base URL.
async fn spawn_server() -> String {
    let config = ServerConfig::new()
        .with_bind_addr(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .with_port(0)
        .with_token_secret(b"integration-secret".to_vec())
        .with_hash_rounds(8);
    let listener = TcpListener::bind(config.socket_addr()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(AppState::new(config).unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn registered(base_url: &str, username: &str) -> IdleClient {
    let mut client = IdleClient::new(base_url).unwrap();
    client
        .register(username, &format!("{username}@example.com"), PASSWORD)
        .await
        .unwrap();
    client
}

fn status(err: Error) -> u16 {
    err.status().unwrap_or_else(|| panic!("expected an API error, got {err}"))
}

// =============================================================================
// USERS
// =============================================================================

#[tokio::test]
async fn test_health() {
    let client = IdleClient::new(spawn_server().await).unwrap();
    assert_eq!(client.health().await.unwrap().status, "ok");
}

#[tokio::test]
async fn test_register_login_profile() {
    let base_url = spawn_server().await;
    let mut client = IdleClient::new(&base_url).unwrap();

    let user = client
        .register("hero", "hero@example.com", PASSWORD)
        .await
        .unwrap();
    assert!(client.token().is_some());
    assert_eq!(client.profile().await.unwrap().id, user.id);

    client.logout();
    assert!(matches!(client.profile().await, Err(Error::NotAuthenticated)));

    let err = client.login("hero@example.com", "Wrong123!").await.unwrap_err();
    assert_eq!(status(err), 401);

    let again = client.login("hero@example.com", PASSWORD).await.unwrap();
    assert_eq!(again.id, user.id);
    assert!(again.last_login.is_some());

    let updated = client
        .update_profile(&UpdateProfileRequest {
            username: Some("champion".into()),
            email: None,
        })
        .await
        .unwrap();
    assert_eq!(updated.username, "champion");
}

#[tokio::test]
async fn test_registration_is_validated() {
    let base_url = spawn_server().await;
    let mut client = IdleClient::new(&base_url).unwrap();

    let err = client
        .register("no spaces", "hero@example.com", PASSWORD)
        .await
        .unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Validation error");
        }
        other => panic!("unexpected error {other}"),
    }

    registered(&base_url, "hero").await;
    let err = client
        .register("hero", "other@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(status(err), 400);
}

#[tokio::test]
async fn test_bad_tokens() {
    let base_url = spawn_server().await;
    let client = IdleClient::new(&base_url).unwrap().with_token("not.a-token");
    let err = client.characters().await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Invalid or expired token");
        }
        other => panic!("unexpected error {other}"),
    }

    // A missing header is a 401, not a 403.
    let response = reqwest::get(format!("{base_url}/characters")).await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_unknown_route() {
    let base_url = spawn_server().await;
    let response = reqwest::get(format!("{base_url}/nowhere")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Route not found");
}

// =============================================================================
// CHARACTERS
// =============================================================================

#[tokio::test]
async fn test_character_crud() {
    let base_url = spawn_server().await;
    let client = registered(&base_url, "hero").await;

    let mage = client.create_character("Merlin", "mage").await.unwrap();
    assert_eq!(mage.stats.intelligence, 15);
    assert_eq!(client.characters().await.unwrap().len(), 1);

    let updated = client
        .update_character(
            mage.id,
            &UpdateCharacterRequest {
                name: Some("Morgana".into()),
                stats: Some(StatAllocation::default().with(Stat::Strength, 10)),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Morgana");
    assert_eq!(updated.stats.strength, 10);

    let err = client
        .update_character(
            mage.id,
            &UpdateCharacterRequest {
                name: None,
                stats: Some(StatAllocation::default().with(Stat::Vitality, 500)),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(status(err), 400);

    client.delete_character(mage.id).await.unwrap();
    let err = client.character(mage.id).await.unwrap_err();
    assert_eq!(status(err), 404);
}

#[tokio::test]
async fn test_characters_are_private() {
    let base_url = spawn_server().await;
    let owner = registered(&base_url, "owner").await;
    let stranger = registered(&base_url, "stranger").await;

    let hero = owner.create_character("Hero", "warrior").await.unwrap();
    assert_eq!(status(stranger.character(hero.id).await.unwrap_err()), 404);
    assert!(stranger.characters().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_class() {
    let base_url = spawn_server().await;
    let client = registered(&base_url, "hero").await;
    let err = client.create_character("Hero", "bard").await.unwrap_err();
    assert_eq!(status(err), 400);
}

// =============================================================================
// GAME
// =============================================================================

#[tokio::test]
async fn test_game_flow() {
    let base_url = spawn_server().await;
    let client = registered(&base_url, "hero").await;
    let hero = client.create_character("Hero", "rogue").await.unwrap();

    // Actions need a state to exist first.
    let err = client
        .perform(hero.id, &Action::StopCombat)
        .await
        .unwrap_err();
    assert_eq!(status(err), 404);

    let state = client.game_state(hero.id).await.unwrap();
    assert_eq!(state.character.name, "Hero");
    assert_eq!(state.currency("gold"), 100);

    let outcome = client
        .perform(hero.id, &Action::start_combat(None))
        .await
        .unwrap();
    assert!(matches!(outcome, ActionOutcome::CombatStarted(_)));

    let err = client
        .perform(hero.id, &Action::start_combat(None))
        .await
        .unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Combat is already active");
        }
        other => panic!("unexpected error {other}"),
    }

    let outcome = client.perform(hero.id, &Action::StopCombat).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::CombatStopped(_)));

    let err = client
        .perform(hero.id, &Action::level_up("strength"))
        .await
        .unwrap_err();
    assert_eq!(status(err), 400);

    let err = client
        .perform(hero.id, &Action::use_item("health-potion"))
        .await
        .unwrap_err();
    match err {
        Error::Api { message, .. } => assert_eq!(message, "Item not found in inventory"),
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_action_bodies_are_validated() {
    let base_url = spawn_server().await;
    let client = registered(&base_url, "hero").await;
    let hero = client.create_character("Hero", "mage").await.unwrap();
    client.game_state(hero.id).await.unwrap();

    let http = reqwest::Client::new();
    let url = format!("{base_url}/game/{}/action", hero.id);
    let cases = [
        (serde_json::json!({"action": "dance"}), "action"),
        (
            serde_json::json!({"action": "levelUp", "data": [1, 2]}),
            "data",
        ),
    ];
    for (body, field) in cases {
        let response = http
            .post(&url)
            .bearer_auth(client.token().unwrap())
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Validation error");
        assert_eq!(body["details"][0]["field"], field);
    }
}

#[tokio::test]
async fn test_placeholder_state_for_unknown_character() {
    let base_url = spawn_server().await;
    let client = registered(&base_url, "hero").await;

    let id = CharacterId::new();
    let state = client.game_state(id).await.unwrap();
    assert_eq!(state.character.id, id);
    assert_eq!(state.character.name, "New Character");

    let other = registered(&base_url, "other").await;
    assert_eq!(status(other.game_state(id).await.unwrap_err()), 404);
}
