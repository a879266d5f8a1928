//! Per-character game state: the unit the action resolver mutates.

use crate::bestiary::Monster;
use crate::character::Character;
use crate::id::{CharacterId, UserId};
use crate::items::Inventory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Area a new character starts in, and the default for `startCombat`.
pub const STARTING_AREA: &str = "starting-area";

/// Gold granted to a fresh game state.
pub const STARTING_GOLD: u64 = 100;

// ============================================================================
// Combat
// ============================================================================

/// The character's combat sub-state.
///
/// `current_monster` is present exactly when `is_active` is true. The running
/// totals are cumulative for the character and survive stopping combat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    pub character_id: CharacterId,
    pub current_area: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_monster: Option<Monster>,
    pub is_active: bool,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub total_damage_dealt: u64,
    pub total_damage_received: u64,
    pub monsters_killed: u64,
    pub experience_gained: u64,
}

impl CombatState {
    /// Not fighting, zeroed counters.
    pub fn idle(character_id: CharacterId, area: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            character_id,
            current_area: area.into(),
            current_monster: None,
            is_active: false,
            start_time: now,
            last_update: now,
            total_damage_dealt: 0,
            total_damage_received: 0,
            monsters_killed: 0,
            experience_gained: 0,
        }
    }

    /// A fresh encounter against `monster`, which should already be a copy.
    pub fn engaged(character_id: CharacterId, area: impl Into<String>, monster: Monster) -> Self {
        Self {
            current_monster: Some(monster),
            is_active: true,
            ..Self::idle(character_id, area)
        }
    }

    pub fn summary(&self) -> CombatSummary {
        CombatSummary {
            total_damage_dealt: self.total_damage_dealt,
            total_damage_received: self.total_damage_received,
            monsters_killed: self.monsters_killed,
            experience_gained: self.experience_gained,
        }
    }
}

/// Running combat totals reported when combat stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSummary {
    pub total_damage_dealt: u64,
    pub total_damage_received: u64,
    pub monsters_killed: u64,
    pub experience_gained: u64,
}

// ============================================================================
// Currencies, achievements, settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: u64,
}

impl CurrencyAmount {
    pub fn new(kind: impl Into<String>, amount: u64) -> Self {
        Self {
            kind: kind.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: u32,
    pub max_progress: u32,
}

/// Player preferences for the idle loop and client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub combat_speed: f64,
    pub auto_advance: bool,
    pub auto_loot: bool,
    pub auto_sell: bool,
    pub notifications: bool,
    pub sound_enabled: bool,
    pub music_enabled: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            combat_speed: 1.0,
            auto_advance: false,
            auto_loot: false,
            auto_sell: false,
            notifications: true,
            sound_enabled: true,
            music_enabled: true,
        }
    }
}

// ============================================================================
// Game state
// ============================================================================

/// Everything the game tracks for one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub character: Character,
    pub combat: CombatState,
    pub inventory: Inventory,
    pub currencies: Vec<CurrencyAmount>,
    pub achievements: Vec<Achievement>,
    pub settings: GameSettings,
}

impl GameState {
    /// Initial state for an existing character.
    pub fn new(character: Character) -> Self {
        let combat = CombatState::idle(character.id, STARTING_AREA);
        Self {
            character,
            combat,
            inventory: Inventory::new(),
            currencies: vec![CurrencyAmount::new("gold", STARTING_GOLD)],
            achievements: Vec::new(),
            settings: GameSettings::default(),
        }
    }

    /// Initial state around a placeholder character.
    pub fn placeholder(character_id: CharacterId, user_id: UserId) -> Self {
        Self::new(Character::placeholder(character_id, user_id))
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn owner(&self) -> UserId {
        self.character.user_id
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_active
    }

    pub fn currency(&self, kind: &str) -> u64 {
        self.currencies
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bestiary::get_monster;

    #[test]
    fn test_placeholder_defaults() {
        let state = GameState::placeholder(CharacterId::new(), UserId::new());
        assert!(!state.in_combat());
        assert!(state.combat.current_monster.is_none());
        assert_eq!(state.combat.current_area, STARTING_AREA);
        assert_eq!(state.currency("gold"), 100);
        assert!(state.inventory.is_empty());
        assert!(state.settings.notifications);
        assert!(!state.settings.auto_loot);
    }

    #[test]
    fn test_engaged_combat_holds_monster() {
        let goblin = get_monster("goblin-1").unwrap();
        let combat = CombatState::engaged(CharacterId::nil(), "caves", goblin.clone());
        assert!(combat.is_active);
        assert_eq!(combat.current_monster, Some(goblin));
        assert_eq!(combat.summary(), CombatSummary::default());
    }

    #[test]
    fn test_state_json_shape() {
        let state = GameState::placeholder(CharacterId::nil(), UserId::nil());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["combat"]["isActive"], false);
        assert!(json["combat"].get("currentMonster").is_none());
        assert_eq!(json["currencies"][0]["type"], "gold");
        assert_eq!(json["character"]["class"], "warrior");
        assert!(json["inventory"].as_array().unwrap().is_empty());
        assert_eq!(json["settings"]["combatSpeed"], 1.0);
    }
}
