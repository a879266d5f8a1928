//! Each user's characters.

use crate::character::{AllocationError, Character, CharacterClass, StatAllocation};
use crate::id::{CharacterId, UserId};
use crate::store::{Store, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Most characters a single user may own.
pub const MAX_CHARACTERS_PER_USER: usize = 5;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Character with this name already exists")]
    NameExists,

    #[error("Character name already taken")]
    NameTaken,

    #[error("Maximum character limit reached ({} characters)", MAX_CHARACTERS_PER_USER)]
    CharacterLimitReached,

    #[error("Character not found")]
    NotFound,

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Changes requested by a character update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub stats: Option<StatAllocation>,
}

pub struct Roster {
    characters: Arc<dyn Store<CharacterId, Character>>,
    write_gate: Mutex<()>,
}

impl Roster {
    pub fn new(characters: Arc<dyn Store<CharacterId, Character>>) -> Self {
        Self {
            characters,
            write_gate: Mutex::new(()),
        }
    }

    /// All characters owned by `user`, oldest first.
    pub async fn list(&self, user: UserId) -> Result<Vec<Character>, RosterError> {
        let mut owned: Vec<Character> = self
            .characters
            .values()
            .await?
            .into_iter()
            .filter(|c| c.user_id == user)
            .collect();
        owned.sort_by_key(|c| c.created_at);
        Ok(owned)
    }

    /// A character, if it exists and belongs to `user`.
    pub async fn get(&self, user: UserId, id: CharacterId) -> Result<Character, RosterError> {
        self.characters
            .get(&id)
            .await?
            .map(|entry| entry.value)
            .filter(|c| c.user_id == user)
            .ok_or(RosterError::NotFound)
    }

    /// Create a level 1 character with its class's base attributes.
    pub async fn create(
        &self,
        user: UserId,
        name: &str,
        class: CharacterClass,
    ) -> Result<Character, RosterError> {
        let _guard = self.write_gate.lock().await;

        let owned = self.list(user).await?;
        if owned.iter().any(|c| c.name == name) {
            return Err(RosterError::NameExists);
        }
        if owned.len() >= MAX_CHARACTERS_PER_USER {
            return Err(RosterError::CharacterLimitReached);
        }

        let character = Character::new(user, name, class);
        self.characters
            .insert(&character.id, character.clone())
            .await?;
        tracing::info!(
            character_id = %character.id,
            user_id = %user,
            class = %class,
            "created character"
        );
        Ok(character)
    }

    /// Rename and/or reallocate attributes. Nothing is written on failure.
    pub async fn update(
        &self,
        user: UserId,
        id: CharacterId,
        update: CharacterUpdate,
    ) -> Result<Character, RosterError> {
        let _guard = self.write_gate.lock().await;

        let mut character = self.get(user, id).await?;

        if let Some(name) = update.name.filter(|n| *n != character.name) {
            let taken = self
                .list(user)
                .await?
                .iter()
                .any(|c| c.id != id && c.name == name);
            if taken {
                return Err(RosterError::NameTaken);
            }
            character.name = name;
        }
        if let Some(allocation) = update.stats {
            character.stats.reallocate(&allocation)?;
        }
        character.touch();

        self.characters.put(&id, character.clone()).await?;
        Ok(character)
    }

    pub async fn delete(&self, user: UserId, id: CharacterId) -> Result<(), RosterError> {
        let _guard = self.write_gate.lock().await;

        self.get(user, id).await?;
        self.characters.remove(&id).await?;
        tracing::info!(character_id = %id, user_id = %user, "deleted character");
        Ok(())
    }
}
