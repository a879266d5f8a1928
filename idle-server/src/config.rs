//! Server configuration, read from the environment.

use axum::http::HeaderValue;
use idle_core::accounts::DEFAULT_HASH_ROUNDS;
use idle_core::game::DEFAULT_RETRY_LIMIT;
use rand::RngCore;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Configuration for the HTTP server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: IpAddr,

    pub port: u16,

    /// Key for signing access tokens.
    pub token_secret: Vec<u8>,

    /// How long an access token stays valid.
    pub token_ttl: chrono::Duration,

    /// Compare-and-swap attempts per game action.
    pub retry_limit: u32,

    /// Allowed CORS origin. Any origin when unset.
    pub cors_origin: Option<HeaderValue>,

    /// PBKDF2 iterations for new password hashes.
    pub hash_rounds: u32,
}

impl ServerConfig {
    /// Defaults with a random, per-process token key.
    pub fn new() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3001,
            token_secret: random_secret(),
            token_ttl: chrono::Duration::hours(24),
            retry_limit: DEFAULT_RETRY_LIMIT,
            cors_origin: None,
            hash_rounds: DEFAULT_HASH_ROUNDS,
        }
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::new();

        if let Some(addr) = parse_var(&lookup, "IDLE_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        match lookup("TOKEN_SECRET") {
            Some(secret) => config.token_secret = decode_secret(&secret),
            None => tracing::warn!("TOKEN_SECRET not set; tokens will not survive a restart"),
        }
        if let Some(hours) = parse_var::<i64, _>(&lookup, "TOKEN_TTL_HOURS")? {
            config.token_ttl = chrono::Duration::try_hours(hours)
                .filter(|ttl| *ttl > chrono::Duration::zero())
                .ok_or_else(|| ConfigError::Invalid {
                    key: "TOKEN_TTL_HOURS",
                    value: hours.to_string(),
                })?;
        }
        if let Some(limit) = parse_var::<u32, _>(&lookup, "ACTION_RETRY_LIMIT")? {
            config.retry_limit = limit.max(1);
        }
        if let Some(rounds) = parse_var::<u32, _>(&lookup, "PASSWORD_HASH_ROUNDS")? {
            config.hash_rounds = rounds.max(1);
        }
        if let Some(origin) = lookup("CORS_ORIGIN") {
            let value = HeaderValue::from_str(origin.trim()).map_err(|_| ConfigError::Invalid {
                key: "CORS_ORIGIN",
                value: origin.clone(),
            })?;
            config.cors_origin = Some(value);
        }

        Ok(config)
    }

    pub fn with_bind_addr(mut self, addr: IpAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_token_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.token_secret = secret.into();
        self
    }

    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit.max(1);
        self
    }

    pub fn with_cors_origin(mut self, origin: HeaderValue) -> Self {
        self.cors_origin = Some(origin);
        self
    }

    pub fn with_hash_rounds(mut self, rounds: u32) -> Self {
        self.hash_rounds = rounds.max(1);
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Keeps the token key out of logs.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("token_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("retry_limit", &self.retry_limit)
            .field("cors_origin", &self.cors_origin)
            .field("hash_rounds", &self.hash_rounds)
            .finish()
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                key,
                value: value.clone(),
            })
        })
        .transpose()
}

/// Hex-encoded secrets are decoded; anything else is used as raw bytes.
fn decode_secret(secret: &str) -> Vec<u8> {
    hex::decode(secret.trim()).unwrap_or_else(|_| secret.as_bytes().to_vec())
}

fn random_secret() -> Vec<u8> {
    let mut key = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3001");
        assert_eq!(config.token_ttl, chrono::Duration::hours(24));
        assert_eq!(config.retry_limit, 3);
        assert_eq!(config.token_secret.len(), 32);
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("IDLE_BIND_ADDR", "127.0.0.1"),
            ("PORT", "8080"),
            ("TOKEN_SECRET", "00ff"),
            ("TOKEN_TTL_HOURS", "2"),
            ("ACTION_RETRY_LIMIT", "0"),
            ("CORS_ORIGIN", "http://localhost:3000"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.token_secret, vec![0x00, 0xff]);
        assert_eq!(config.token_ttl, chrono::Duration::hours(2));
        assert_eq!(config.retry_limit, 1);
        assert_eq!(
            config.cors_origin,
            Some(HeaderValue::from_static("http://localhost:3000"))
        );
    }

    #[test]
    fn test_raw_secret() {
        let config = ServerConfig::from_lookup(lookup(&[("TOKEN_SECRET", "not hex!")])).unwrap();
        assert_eq!(config.token_secret, b"not hex!".to_vec());
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(ServerConfig::from_lookup(lookup(&[("TOKEN_TTL_HOURS", "0")])).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ServerConfig::new().with_token_secret(b"hunter2".to_vec());
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
