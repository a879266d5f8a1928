//! Idle RPG game engine.
//!
//! This crate provides:
//! - Characters, classes, items and the monster table
//! - An Action/Effect resolver for combat, equipment, consumables and level-ups
//! - Account and character roster rules
//! - A versioned storage abstraction with an in-memory backend
//! - A game service that applies actions with optimistic concurrency
//!
//! # Quick Start
//!
//! ```ignore
//! use idle_core::{Action, GameService, MemoryStore};
//! use std::sync::Arc;
//!
//! let game = GameService::new(Arc::new(MemoryStore::new()));
//! let state = game.state(user_id, character_id, None).await?;
//! let outcome = game.perform(user_id, character_id, &Action::start_combat(None)).await?;
//! ```

pub mod accounts;
pub mod api;
pub mod bestiary;
pub mod character;
pub mod game;
pub mod id;
pub mod items;
pub mod roster;
pub mod rules;
pub mod state;
pub mod store;
pub mod testing;

// Primary public API
pub use accounts::{AccountError, Accounts, ProfileUpdate, User, UserProfile};
pub use character::{
    AllocationError, Character, CharacterClass, CharacterStats, Equipment, EquipmentSlot, Stat,
    StatAllocation,
};
pub use game::{GameError, GameService};
pub use id::{CharacterId, UserId};
pub use roster::{CharacterUpdate, Roster, RosterError, MAX_CHARACTERS_PER_USER};
pub use rules::{Action, ActionError, ActionOutcome, ActionRequest, Resolver};
pub use state::GameState;
pub use store::{MemoryStore, Store, StoreError, Version, Versioned};
