//! User accounts: registration, credential checks and profile edits.
//!
//! Passwords are stored as salted PBKDF2-HMAC-SHA256 digests in the form
//! `pbkdf2-sha256$<rounds>$<salt>$<hash>` (base64, no padding).

use crate::id::UserId;
use crate::store::{Store, StoreError};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Default PBKDF2 iteration count.
pub const DEFAULT_HASH_ROUNDS: u32 = 100_000;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User with this email or username already exists")]
    AlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already taken")]
    EmailTaken,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A stored account, including its password digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub is_verified: bool,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            last_login: self.last_login,
            is_verified: self.is_verified,
        }
    }

    fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

/// The public view of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub is_verified: bool,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// The account registry.
pub struct Accounts {
    users: Arc<dyn Store<UserId, User>>,
    /// Serializes writes that must keep usernames and emails unique.
    write_gate: Mutex<()>,
    hash_rounds: u32,
}

impl Accounts {
    pub fn new(users: Arc<dyn Store<UserId, User>>) -> Self {
        Self {
            users,
            write_gate: Mutex::new(()),
            hash_rounds: DEFAULT_HASH_ROUNDS,
        }
    }

    pub fn with_hash_rounds(mut self, rounds: u32) -> Self {
        self.hash_rounds = rounds.max(1);
        self
    }

    /// Create an account. Username and email must both be unused.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AccountError> {
        let _guard = self.write_gate.lock().await;

        let existing = self.users.values().await?;
        if existing
            .iter()
            .any(|u| u.has_email(email) || u.username == username)
        {
            return Err(AccountError::AlreadyExists);
        }

        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password, self.hash_rounds),
            created_at: Utc::now(),
            last_login: None,
            is_verified: false,
        };
        self.users.insert(&user.id, user.clone()).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user.profile())
    }

    /// Check credentials and record the login time.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AccountError> {
        let mut user = self
            .users
            .values()
            .await?
            .into_iter()
            .find(|u| u.has_email(email))
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "rejected login");
            return Err(AccountError::InvalidCredentials);
        }

        user.last_login = Some(Utc::now());
        self.users.put(&user.id, user.clone()).await?;
        Ok(user.profile())
    }

    pub async fn profile(&self, id: UserId) -> Result<UserProfile, AccountError> {
        self.users
            .get(&id)
            .await?
            .map(|entry| entry.value.profile())
            .ok_or(AccountError::NotFound)
    }

    /// Change username and/or email, keeping both unique across accounts.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AccountError> {
        let _guard = self.write_gate.lock().await;

        let mut user = self
            .users
            .get(&id)
            .await?
            .ok_or(AccountError::NotFound)?
            .value;
        let others: Vec<User> = self
            .users
            .values()
            .await?
            .into_iter()
            .filter(|u| u.id != id)
            .collect();

        if let Some(username) = update.username.filter(|n| *n != user.username) {
            if others.iter().any(|u| u.username == username) {
                return Err(AccountError::UsernameTaken);
            }
            user.username = username;
        }
        if let Some(email) = update.email.filter(|e| *e != user.email) {
            if others.iter().any(|u| u.has_email(&email)) {
                return Err(AccountError::EmailTaken);
            }
            user.email = email;
        }

        self.users.put(&id, user.clone()).await?;
        Ok(user.profile())
    }
}

// ============================================================================
// Password hashing
// ============================================================================

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, rounds: u32) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let digest = derive(password, &salt, rounds);
    format!(
        "{HASH_SCHEME}${rounds}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest)
    )
}

/// Check `password` against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(HASH_SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let (Ok(rounds), Ok(salt), Ok(expected)) = (
        rounds.parse::<u32>(),
        STANDARD_NO_PAD.decode(salt),
        STANDARD_NO_PAD.decode(expected),
    ) else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    constant_time_eq(&derive(password, &salt, rounds), &expected)
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
