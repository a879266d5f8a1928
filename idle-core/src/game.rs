//! Game state service: loads, resolves and writes back per-character state.
//!
//! Writes use the store's version stamps. If another request updated the
//! state between our read and our write, the action is recomputed from the
//! fresh state, up to `retry_limit` attempts.

use crate::character::Character;
use crate::id::{CharacterId, UserId};
use crate::rules::{Action, ActionError, ActionOutcome, ActionRequest, Resolver};
use crate::state::GameState;
use crate::store::{Store, StoreError, Versioned};
use std::sync::Arc;
use thiserror::Error;

/// Default number of compare-and-swap attempts per action.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Game state not found")]
    NotFound,

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("Game state for {character_id} kept changing; gave up after {attempts} attempts")]
    Conflict {
        character_id: CharacterId,
        attempts: u32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct GameService {
    states: Arc<dyn Store<CharacterId, GameState>>,
    resolver: Resolver,
    retry_limit: u32,
}

impl GameService {
    pub fn new(states: Arc<dyn Store<CharacterId, GameState>>) -> Self {
        Self {
            states,
            resolver: Resolver::new(),
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit.max(1);
        self
    }

    /// Fetch a character's game state, creating it on first access.
    ///
    /// A new state is built around `seed` when it is the caller's own
    /// character with this id, and around a placeholder otherwise.
    pub async fn state(
        &self,
        user: UserId,
        character_id: CharacterId,
        seed: Option<Character>,
    ) -> Result<GameState, GameError> {
        if let Some(existing) = self.load(user, character_id).await? {
            return Ok(existing.value);
        }

        let state = seed
            .filter(|c| c.id == character_id && c.user_id == user)
            .map(GameState::new)
            .unwrap_or_else(|| GameState::placeholder(character_id, user));

        match self.states.insert(&character_id, state.clone()).await {
            Ok(_) => {
                tracing::info!(%character_id, user_id = %user, "created game state");
                Ok(state)
            }
            // Someone else created it first; theirs wins.
            Err(StoreError::Conflict { .. }) => self
                .load(user, character_id)
                .await?
                .map(|entry| entry.value)
                .ok_or(GameError::NotFound),
        }
    }

    /// Decode a raw request and perform it.
    ///
    /// A missing state is reported before a malformed payload.
    pub async fn dispatch(
        &self,
        user: UserId,
        character_id: CharacterId,
        request: ActionRequest,
    ) -> Result<ActionOutcome, GameError> {
        if self.load(user, character_id).await?.is_none() {
            return Err(GameError::NotFound);
        }
        let action = Action::try_from(request)?;
        self.perform(user, character_id, &action).await
    }

    /// Apply `action` to an existing game state.
    pub async fn perform(
        &self,
        user: UserId,
        character_id: CharacterId,
        action: &Action,
    ) -> Result<ActionOutcome, GameError> {
        for attempt in 1..=self.retry_limit {
            let Versioned { value, version } = self
                .load(user, character_id)
                .await?
                .ok_or(GameError::NotFound)?;

            let mut state = value;
            let outcome = self
                .resolver
                .perform(&mut state, action, &mut rand::thread_rng())?;
            state.character.touch();

            match self
                .states
                .compare_and_swap(&character_id, Some(version), state)
                .await
            {
                Ok(_) => {
                    tracing::debug!(%character_id, action = action.name(), attempt, "action applied");
                    return Ok(outcome);
                }
                Err(StoreError::Conflict { .. }) => {
                    tracing::debug!(%character_id, attempt, "stale game state, retrying");
                }
            }
        }

        tracing::warn!(
            %character_id,
            attempts = self.retry_limit,
            "giving up on contended game state"
        );
        Err(GameError::Conflict {
            character_id,
            attempts: self.retry_limit,
        })
    }

    /// Read a state, hiding states owned by other users.
    async fn load(
        &self,
        user: UserId,
        character_id: CharacterId,
    ) -> Result<Option<Versioned<GameState>>, GameError> {
        match self.states.get(&character_id).await? {
            Some(entry) if entry.value.owner() != user => Err(GameError::NotFound),
            other => Ok(other),
        }
    }
}
