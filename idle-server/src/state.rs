//! Shared handler state.

use crate::auth::{TokenError, TokenSigner};
use crate::config::ServerConfig;
use idle_core::{Accounts, GameService, MemoryStore, Roster};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tokens: Arc<TokenSigner>,
    pub accounts: Arc<Accounts>,
    pub roster: Arc<Roster>,
    pub game: Arc<GameService>,
}

impl AppState {
    /// Wire up services over process-local stores.
    pub fn new(config: ServerConfig) -> Result<Self, TokenError> {
        let tokens = TokenSigner::new(&config.token_secret, config.token_ttl)?;
        let accounts =
            Accounts::new(Arc::new(MemoryStore::new())).with_hash_rounds(config.hash_rounds);
        let roster = Roster::new(Arc::new(MemoryStore::new()));
        let game =
            GameService::new(Arc::new(MemoryStore::new())).with_retry_limit(config.retry_limit);

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            accounts: Arc::new(accounts),
            roster: Arc::new(roster),
            game: Arc::new(game),
        })
    }
}
