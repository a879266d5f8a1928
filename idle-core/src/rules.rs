//! Action resolver with an Action/Effect split.
//!
//! The pipeline mirrors how every request is handled:
//! 1. The client names an [`Action`] and its payload
//! 2. [`Resolver::resolve`] checks it against the current [`GameState`]
//! 3. A [`Resolution`] lists the [`Effect`]s and the result to report
//! 4. [`apply_effects`] writes the effects into the state
//!
//! Resolution never mutates, so a rejected action leaves state untouched.

use crate::bestiary::{Monster, MONSTERS};
use crate::character::{EquipmentSlot, Stat};
use crate::items::Item;
use crate::state::{CombatState, CombatSummary, GameState, STARTING_AREA};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors from resolving an action. None of them mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Combat is already active")]
    AlreadyInCombat,

    #[error("Combat is not active")]
    NotInCombat,

    #[error("Item not found in inventory")]
    ItemNotFound { item_id: String },

    #[error("Invalid equipment slot")]
    InvalidSlot { slot: String },

    #[error("Item cannot be used")]
    ItemNotUsable { item_id: String },

    #[error("No stat points available")]
    NoPointsAvailable,

    #[error("Invalid stat")]
    InvalidStat { stat: String },

    #[error("Stat is already at its maximum value")]
    StatAtMaximum { stat: Stat },

    #[error("Invalid action")]
    InvalidAction { action: String },

    #[error("Invalid data for action '{action}': {reason}")]
    InvalidPayload { action: String, reason: String },

    #[error("No monsters available for a level {level} character")]
    NoEligibleMonsters { level: u32 },
}

// ============================================================================
// Actions
// ============================================================================

/// Payload for [`Action::StartCombat`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCombat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

/// Payload for [`Action::EquipItem`].
///
/// `slot` stays a string until resolution so a missing item is reported
/// before a bad slot name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipItem {
    pub item_id: String,
    pub slot: String,
}

/// Payload for [`Action::UseItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseItem {
    pub item_id: String,
}

/// Payload for [`Action::LevelUp`].
///
/// `stat` stays a string until resolution so an empty point pool is reported
/// before a bad stat name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub stat: String,
}

/// A command applied to a character's game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartCombat(StartCombat),
    StopCombat,
    EquipItem(EquipItem),
    UseItem(UseItem),
    LevelUp(LevelUp),
}

/// The raw `{ action, data }` body as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Action {
    /// Every action name the resolver understands.
    pub const NAMES: [&'static str; 5] =
        ["startCombat", "stopCombat", "equipItem", "useItem", "levelUp"];

    pub fn start_combat(area: Option<&str>) -> Self {
        Action::StartCombat(StartCombat {
            area: area.map(str::to_string),
        })
    }

    pub fn equip(item_id: impl Into<String>, slot: impl Into<String>) -> Self {
        Action::EquipItem(EquipItem {
            item_id: item_id.into(),
            slot: slot.into(),
        })
    }

    pub fn use_item(item_id: impl Into<String>) -> Self {
        Action::UseItem(UseItem {
            item_id: item_id.into(),
        })
    }

    pub fn level_up(stat: impl Into<String>) -> Self {
        Action::LevelUp(LevelUp { stat: stat.into() })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::StartCombat(_) => "startCombat",
            Action::StopCombat => "stopCombat",
            Action::EquipItem(_) => "equipItem",
            Action::UseItem(_) => "useItem",
            Action::LevelUp(_) => "levelUp",
        }
    }

    /// Decode an action name and its untyped payload.
    ///
    /// A missing or `null` payload is read as an empty object.
    pub fn decode(name: &str, data: Option<Value>) -> Result<Self, ActionError> {
        let data = match data {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(value) => value,
        };
        match name {
            "startCombat" => decode_payload(name, data).map(Action::StartCombat),
            "stopCombat" => Ok(Action::StopCombat),
            "equipItem" => decode_payload(name, data).map(Action::EquipItem),
            "useItem" => decode_payload(name, data).map(Action::UseItem),
            "levelUp" => decode_payload(name, data).map(Action::LevelUp),
            other => Err(ActionError::InvalidAction {
                action: other.to_string(),
            }),
        }
    }

    /// Encode back into the wire form.
    pub fn to_request(&self) -> ActionRequest {
        let data = match self {
            Action::StartCombat(payload) => serde_json::to_value(payload).ok(),
            Action::StopCombat => None,
            Action::EquipItem(payload) => serde_json::to_value(payload).ok(),
            Action::UseItem(payload) => serde_json::to_value(payload).ok(),
            Action::LevelUp(payload) => serde_json::to_value(payload).ok(),
        };
        ActionRequest {
            action: self.name().to_string(),
            data,
        }
    }
}

impl TryFrom<ActionRequest> for Action {
    type Error = ActionError;

    fn try_from(request: ActionRequest) -> Result<Self, Self::Error> {
        Action::decode(&request.action, request.data)
    }
}

fn decode_payload<T: DeserializeOwned>(action: &str, data: Value) -> Result<T, ActionError> {
    serde_json::from_value(data).map_err(|e| ActionError::InvalidPayload {
        action: action.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Effects and outcomes
// ============================================================================

/// An item knocked out of a slot by an equip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displaced {
    pub item_id: String,
    pub position: u32,
}

/// A single state change produced by resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Replace the combat state with a fresh encounter.
    CombatStarted { combat: CombatState },

    /// Leave combat, keeping the running totals.
    CombatStopped,

    ItemEquipped {
        item_id: String,
        slot: EquipmentSlot,
        /// Slot the item occupied before, if it moves between slots.
        previous_slot: Option<EquipmentSlot>,
        displaced: Option<Displaced>,
    },

    ItemConsumed { item_id: String, remaining: u32 },

    StatIncreased { stat: Stat },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStarted {
    pub combat_started: bool,
    pub monster: Monster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStopped {
    pub combat_stopped: bool,
    pub stats: CombatSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEquipped {
    pub item_equipped: bool,
    pub slot: EquipmentSlot,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUsed {
    pub item_used: bool,
    pub effects: String,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRaised {
    pub level_up: bool,
    pub stat: Stat,
    pub new_value: u32,
    pub remaining_points: u32,
}

/// What an action reports back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    CombatStarted(CombatStarted),
    CombatStopped(CombatStopped),
    ItemEquipped(ItemEquipped),
    ItemUsed(ItemUsed),
    StatRaised(StatRaised),
}

/// The result of resolving an action: what to report and what to change.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: ActionOutcome,
    pub effects: Vec<Effect>,
}

impl Resolution {
    pub fn new(outcome: ActionOutcome) -> Self {
        Self {
            outcome,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves actions against a game state using a monster table.
#[derive(Debug, Clone)]
pub struct Resolver {
    monsters: Arc<[Monster]>,
}

impl Resolver {
    /// A resolver over the standard monster table.
    pub fn new() -> Self {
        Self::with_monsters(MONSTERS.clone())
    }

    pub fn with_monsters(monsters: Vec<Monster>) -> Self {
        Self {
            monsters: monsters.into(),
        }
    }

    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    /// Work out what `action` would do to `state` without changing it.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        action: &Action,
        rng: &mut R,
    ) -> Result<Resolution, ActionError> {
        match action {
            Action::StartCombat(payload) => self.resolve_start_combat(state, payload, rng),
            Action::StopCombat => self.resolve_stop_combat(state),
            Action::EquipItem(payload) => self.resolve_equip_item(state, payload),
            Action::UseItem(payload) => self.resolve_use_item(state, payload),
            Action::LevelUp(payload) => self.resolve_level_up(state, payload),
        }
    }

    /// Resolve and apply in one step. On error `state` is unchanged.
    pub fn perform<R: Rng + ?Sized>(
        &self,
        state: &mut GameState,
        action: &Action,
        rng: &mut R,
    ) -> Result<ActionOutcome, ActionError> {
        let resolution = self.resolve(state, action, rng)?;
        apply_effects(state, &resolution.effects);
        Ok(resolution.outcome)
    }

    fn resolve_start_combat<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        payload: &StartCombat,
        rng: &mut R,
    ) -> Result<Resolution, ActionError> {
        if state.combat.is_active {
            return Err(ActionError::AlreadyInCombat);
        }

        let level = state.character.level;
        let eligible: Vec<&Monster> = self
            .monsters
            .iter()
            .filter(|m| m.is_eligible_for(level))
            .collect();
        let monster = eligible
            .choose(rng)
            .map(|m| (*m).clone())
            .ok_or(ActionError::NoEligibleMonsters { level })?;

        let area = payload.area.as_deref().unwrap_or(STARTING_AREA);
        let combat = CombatState::engaged(state.character.id, area, monster.clone());

        Ok(Resolution::new(ActionOutcome::CombatStarted(CombatStarted {
            combat_started: true,
            monster,
        }))
        .with_effect(Effect::CombatStarted { combat }))
    }

    fn resolve_stop_combat(&self, state: &GameState) -> Result<Resolution, ActionError> {
        if !state.combat.is_active {
            return Err(ActionError::NotInCombat);
        }

        Ok(Resolution::new(ActionOutcome::CombatStopped(CombatStopped {
            combat_stopped: true,
            stats: state.combat.summary(),
        }))
        .with_effect(Effect::CombatStopped))
    }

    fn resolve_equip_item(
        &self,
        state: &GameState,
        payload: &EquipItem,
    ) -> Result<Resolution, ActionError> {
        let entry = state
            .inventory
            .find(&payload.item_id)
            .ok_or_else(|| ActionError::ItemNotFound {
                item_id: payload.item_id.clone(),
            })?;
        let slot: EquipmentSlot = payload
            .slot
            .parse()
            .map_err(|_| ActionError::InvalidSlot {
                slot: payload.slot.clone(),
            })?;

        let equipment = &state.character.equipment;
        let previous_slot = equipment
            .slot_of(&payload.item_id)
            .filter(|current| *current != slot);

        // The item being equipped leaves the grid, so its cell is free for
        // whatever it knocks out of the slot.
        let displaced = equipment
            .get(slot)
            .filter(|occupant| *occupant != payload.item_id)
            .filter(|occupant| state.inventory.contains(occupant))
            .map(|occupant| Displaced {
                item_id: occupant.to_string(),
                position: state
                    .inventory
                    .next_free_position_excluding(Some(&payload.item_id)),
            });

        Ok(Resolution::new(ActionOutcome::ItemEquipped(ItemEquipped {
            item_equipped: true,
            slot,
            item: entry.item.clone(),
        }))
        .with_effect(Effect::ItemEquipped {
            item_id: payload.item_id.clone(),
            slot,
            previous_slot,
            displaced,
        }))
    }

    fn resolve_use_item(
        &self,
        state: &GameState,
        payload: &UseItem,
    ) -> Result<Resolution, ActionError> {
        let entry = state
            .inventory
            .find(&payload.item_id)
            .ok_or_else(|| ActionError::ItemNotFound {
                item_id: payload.item_id.clone(),
            })?;
        if !entry.item.is_consumable() {
            return Err(ActionError::ItemNotUsable {
                item_id: payload.item_id.clone(),
            });
        }

        let remaining = entry.quantity.saturating_sub(1);
        Ok(Resolution::new(ActionOutcome::ItemUsed(ItemUsed {
            item_used: true,
            effects: format!("{} used", entry.item.name),
            remaining,
        }))
        .with_effect(Effect::ItemConsumed {
            item_id: payload.item_id.clone(),
            remaining,
        }))
    }

    fn resolve_level_up(
        &self,
        state: &GameState,
        payload: &LevelUp,
    ) -> Result<Resolution, ActionError> {
        let stats = &state.character.stats;
        if stats.available_points == 0 {
            return Err(ActionError::NoPointsAvailable);
        }
        let stat: Stat = payload
            .stat
            .parse()
            .map_err(|_| ActionError::InvalidStat {
                stat: payload.stat.clone(),
            })?;
        let new_value = stats
            .get(stat)
            .checked_add(1)
            .ok_or(ActionError::StatAtMaximum { stat })?;

        Ok(Resolution::new(ActionOutcome::StatRaised(StatRaised {
            level_up: true,
            stat,
            new_value,
            remaining_points: stats.available_points - 1,
        }))
        .with_effect(Effect::StatIncreased { stat }))
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a list of effects in order.
pub fn apply_effects(state: &mut GameState, effects: &[Effect]) {
    for effect in effects {
        apply_effect(state, effect);
    }
}

/// Apply a single effect to the game state.
pub fn apply_effect(state: &mut GameState, effect: &Effect) {
    match effect {
        Effect::CombatStarted { combat } => {
            state.combat = combat.clone();
        }
        Effect::CombatStopped => {
            state.combat.is_active = false;
            state.combat.current_monster = None;
        }
        Effect::ItemEquipped {
            item_id,
            slot,
            previous_slot,
            displaced,
        } => {
            if let Some(previous) = previous_slot {
                state.character.equipment.set(*previous, None);
            }
            if let Some(displaced) = displaced {
                if let Some(entry) = state.inventory.find_mut(&displaced.item_id) {
                    entry.position = Some(displaced.position);
                }
            }
            state.character.equipment.set(*slot, Some(item_id.clone()));
            if let Some(entry) = state.inventory.find_mut(item_id) {
                entry.position = None;
            }
        }
        Effect::ItemConsumed { item_id, remaining } => {
            if *remaining == 0 {
                state.inventory.remove(item_id);
                state.character.equipment.clear_item(item_id);
            } else if let Some(entry) = state.inventory.find_mut(item_id) {
                entry.quantity = *remaining;
            }
        }
        Effect::StatIncreased { stat } => {
            let stats = &mut state.character.stats;
            // Resolution already rejected a stat at its ceiling.
            if let Some(value) = stats.get(*stat).checked_add(1) {
                stats.set(*stat, value);
                stats.available_points = stats.available_points.saturating_sub(1);
            }
        }
    }
}
