//! Characters, classes, attributes and equipment slots.

use crate::id::{CharacterId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Classes
// ============================================================================

/// Playable character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    Warrior,
    Mage,
    Rogue,
    Paladin,
    Necromancer,
}

impl CharacterClass {
    pub fn all() -> [CharacterClass; 5] {
        [
            CharacterClass::Warrior,
            CharacterClass::Mage,
            CharacterClass::Rogue,
            CharacterClass::Paladin,
            CharacterClass::Necromancer,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Warrior => "warrior",
            CharacterClass::Mage => "mage",
            CharacterClass::Rogue => "rogue",
            CharacterClass::Paladin => "paladin",
            CharacterClass::Necromancer => "necromancer",
        }
    }

    /// Starting attributes for a freshly created character of this class.
    pub fn base_stats(&self) -> CharacterStats {
        match self {
            CharacterClass::Warrior => CharacterStats::new(15, 10, 8, 12, 0),
            CharacterClass::Mage => CharacterStats::new(8, 10, 15, 12, 0),
            CharacterClass::Rogue => CharacterStats::new(10, 15, 10, 10, 0),
            CharacterClass::Paladin => CharacterStats::new(12, 10, 12, 11, 0),
            CharacterClass::Necromancer => CharacterStats::new(8, 12, 15, 10, 0),
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CharacterClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CharacterClass::all()
            .into_iter()
            .find(|class| class.name() == s)
            .ok_or_else(|| format!("unknown character class '{s}'"))
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// The four allocatable attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Strength,
    Dexterity,
    Intelligence,
    Vitality,
}

impl Stat {
    pub fn all() -> [Stat; 4] {
        [
            Stat::Strength,
            Stat::Dexterity,
            Stat::Intelligence,
            Stat::Vitality,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Strength => "strength",
            Stat::Dexterity => "dexterity",
            Stat::Intelligence => "intelligence",
            Stat::Vitality => "vitality",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::all()
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| format!("unknown stat '{s}'"))
    }
}

/// Errors from reallocating a character's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("Not enough stat points available")]
    InsufficientPoints { requested: u64, available: u64 },

    #[error("Unspent stat points would exceed the maximum")]
    PointsOverflow { remaining: u64 },
}

/// Attribute scores plus unspent points.
///
/// The sum of all five fields is the character's stat pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStats {
    pub strength: u32,
    pub dexterity: u32,
    pub intelligence: u32,
    pub vitality: u32,
    pub available_points: u32,
}

impl CharacterStats {
    pub fn new(
        strength: u32,
        dexterity: u32,
        intelligence: u32,
        vitality: u32,
        available_points: u32,
    ) -> Self {
        Self {
            strength,
            dexterity,
            intelligence,
            vitality,
            available_points,
        }
    }

    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::Dexterity => self.dexterity,
            Stat::Intelligence => self.intelligence,
            Stat::Vitality => self.vitality,
        }
    }

    pub fn set(&mut self, stat: Stat, value: u32) {
        match stat {
            Stat::Strength => self.strength = value,
            Stat::Dexterity => self.dexterity = value,
            Stat::Intelligence => self.intelligence = value,
            Stat::Vitality => self.vitality = value,
        }
    }

    /// Sum of the four attributes.
    pub fn allocated(&self) -> u64 {
        Stat::all().iter().map(|s| u64::from(self.get(*s))).sum()
    }

    /// Allocated attributes plus unspent points.
    pub fn pool(&self) -> u64 {
        self.allocated() + u64::from(self.available_points)
    }

    /// Apply a partial attribute assignment.
    ///
    /// Attributes missing from `allocation` count as zero towards the points
    /// used, but keep their stored value. Unspent points are recomputed as
    /// `pool - used`.
    pub fn reallocate(&mut self, allocation: &StatAllocation) -> Result<(), AllocationError> {
        let available = self.pool();
        let requested = allocation.requested_total();
        if requested > available {
            return Err(AllocationError::InsufficientPoints {
                requested,
                available,
            });
        }
        let remaining = available - requested;
        let remaining_points = u32::try_from(remaining)
            .map_err(|_| AllocationError::PointsOverflow { remaining })?;

        for stat in Stat::all() {
            if let Some(value) = allocation.get(stat) {
                self.set(stat, value);
            }
        }
        self.available_points = remaining_points;
        Ok(())
    }
}

/// A partial attribute assignment, as sent by a profile update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatAllocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dexterity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitality: Option<u32>,
}

impl StatAllocation {
    pub fn get(&self, stat: Stat) -> Option<u32> {
        match stat {
            Stat::Strength => self.strength,
            Stat::Dexterity => self.dexterity,
            Stat::Intelligence => self.intelligence,
            Stat::Vitality => self.vitality,
        }
    }

    pub fn with(mut self, stat: Stat, value: u32) -> Self {
        match stat {
            Stat::Strength => self.strength = Some(value),
            Stat::Dexterity => self.dexterity = Some(value),
            Stat::Intelligence => self.intelligence = Some(value),
            Stat::Vitality => self.vitality = Some(value),
        }
        self
    }

    /// Points this assignment would use; unspecified attributes count as 0.
    pub fn requested_total(&self) -> u64 {
        Stat::all()
            .iter()
            .map(|s| u64::from(self.get(*s).unwrap_or(0)))
            .sum()
    }
}

// ============================================================================
// Equipment
// ============================================================================

/// Named equipment attachment points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Helmet,
    Boots,
    Gloves,
    Belt,
    Ring1,
    Ring2,
    Amulet,
    Shield,
}

impl EquipmentSlot {
    pub fn all() -> [EquipmentSlot; 10] {
        [
            EquipmentSlot::Weapon,
            EquipmentSlot::Armor,
            EquipmentSlot::Helmet,
            EquipmentSlot::Boots,
            EquipmentSlot::Gloves,
            EquipmentSlot::Belt,
            EquipmentSlot::Ring1,
            EquipmentSlot::Ring2,
            EquipmentSlot::Amulet,
            EquipmentSlot::Shield,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            EquipmentSlot::Weapon => "weapon",
            EquipmentSlot::Armor => "armor",
            EquipmentSlot::Helmet => "helmet",
            EquipmentSlot::Boots => "boots",
            EquipmentSlot::Gloves => "gloves",
            EquipmentSlot::Belt => "belt",
            EquipmentSlot::Ring1 => "ring1",
            EquipmentSlot::Ring2 => "ring2",
            EquipmentSlot::Amulet => "amulet",
            EquipmentSlot::Shield => "shield",
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EquipmentSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EquipmentSlot::all()
            .into_iter()
            .find(|slot| slot.name() == s)
            .ok_or_else(|| format!("unknown equipment slot '{s}'"))
    }
}

/// Item ids currently attached to each slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helmet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boots: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloves: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amulet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield: Option<String>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, slot: EquipmentSlot) -> &mut Option<String> {
        match slot {
            EquipmentSlot::Weapon => &mut self.weapon,
            EquipmentSlot::Armor => &mut self.armor,
            EquipmentSlot::Helmet => &mut self.helmet,
            EquipmentSlot::Boots => &mut self.boots,
            EquipmentSlot::Gloves => &mut self.gloves,
            EquipmentSlot::Belt => &mut self.belt,
            EquipmentSlot::Ring1 => &mut self.ring1,
            EquipmentSlot::Ring2 => &mut self.ring2,
            EquipmentSlot::Amulet => &mut self.amulet,
            EquipmentSlot::Shield => &mut self.shield,
        }
    }

    pub fn get(&self, slot: EquipmentSlot) -> Option<&str> {
        match slot {
            EquipmentSlot::Weapon => self.weapon.as_deref(),
            EquipmentSlot::Armor => self.armor.as_deref(),
            EquipmentSlot::Helmet => self.helmet.as_deref(),
            EquipmentSlot::Boots => self.boots.as_deref(),
            EquipmentSlot::Gloves => self.gloves.as_deref(),
            EquipmentSlot::Belt => self.belt.as_deref(),
            EquipmentSlot::Ring1 => self.ring1.as_deref(),
            EquipmentSlot::Ring2 => self.ring2.as_deref(),
            EquipmentSlot::Amulet => self.amulet.as_deref(),
            EquipmentSlot::Shield => self.shield.as_deref(),
        }
    }

    /// Put `item_id` into `slot` (or empty it), returning the previous occupant.
    pub fn set(&mut self, slot: EquipmentSlot, item_id: Option<String>) -> Option<String> {
        std::mem::replace(self.slot_mut(slot), item_id)
    }

    /// The slot currently holding `item_id`, if any.
    pub fn slot_of(&self, item_id: &str) -> Option<EquipmentSlot> {
        EquipmentSlot::all()
            .into_iter()
            .find(|slot| self.get(*slot) == Some(item_id))
    }

    /// Empty every slot that references `item_id`.
    pub fn clear_item(&mut self, item_id: &str) {
        for slot in EquipmentSlot::all() {
            if self.get(slot) == Some(item_id) {
                self.set(slot, None);
            }
        }
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        EquipmentSlot::all()
            .iter()
            .filter(|slot| self.get(**slot).is_some())
            .count()
    }
}

// ============================================================================
// Character
// ============================================================================

/// Progress in a single skill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProgress {
    pub level: u32,
    pub experience: u64,
    pub unlocked: bool,
}

/// A player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    pub class: CharacterClass,
    pub level: u32,
    pub experience: u64,
    pub stats: CharacterStats,
    pub equipment: Equipment,
    pub skills: BTreeMap<String, SkillProgress>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Character {
    /// A level 1 character with its class's base attributes.
    pub fn new(user_id: UserId, name: impl Into<String>, class: CharacterClass) -> Self {
        let now = Utc::now();
        Self {
            id: CharacterId::new(),
            user_id,
            name: name.into(),
            class,
            level: 1,
            experience: 0,
            stats: class.base_stats(),
            equipment: Equipment::new(),
            skills: BTreeMap::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Stand-in used when game state is requested for a character the
    /// roster does not know about.
    pub fn placeholder(id: CharacterId, user_id: UserId) -> Self {
        Self {
            id,
            name: "New Character".to_string(),
            stats: CharacterStats::new(10, 10, 10, 10, 0),
            ..Self::new(user_id, "", CharacterClass::Warrior)
        }
    }

    /// Refresh the last-active timestamp.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_round_trips_through_name() {
        for class in CharacterClass::all() {
            assert_eq!(class.name().parse::<CharacterClass>(), Ok(class));
        }
        assert!("bard".parse::<CharacterClass>().is_err());
    }

    #[test]
    fn test_class_base_stats() {
        let warrior = CharacterClass::Warrior.base_stats();
        assert_eq!(warrior, CharacterStats::new(15, 10, 8, 12, 0));
        let necro = CharacterClass::Necromancer.base_stats();
        assert_eq!(necro.intelligence, 15);
        assert_eq!(necro.available_points, 0);
    }

    #[test]
    fn test_reallocate_full_assignment_conserves_pool() {
        let mut stats = CharacterStats::new(10, 10, 10, 10, 4);
        let allocation = StatAllocation::default()
            .with(Stat::Strength, 13)
            .with(Stat::Dexterity, 10)
            .with(Stat::Intelligence, 11)
            .with(Stat::Vitality, 10);
        stats.reallocate(&allocation).unwrap();
        assert_eq!(stats, CharacterStats::new(13, 10, 11, 10, 0));
        assert_eq!(stats.pool(), 44);
    }

    #[test]
    fn test_reallocate_partial_counts_missing_as_zero() {
        let mut stats = CharacterStats::new(10, 10, 10, 10, 0);
        let allocation = StatAllocation::default().with(Stat::Strength, 12);
        stats.reallocate(&allocation).unwrap();
        assert_eq!(stats.strength, 12);
        assert_eq!(stats.dexterity, 10);
        assert_eq!(stats.intelligence, 10);
        assert_eq!(stats.vitality, 10);
        assert_eq!(stats.available_points, 28);
    }

    #[test]
    fn test_reallocate_rejects_overdraw_without_mutation() {
        let mut stats = CharacterStats::new(10, 10, 10, 10, 0);
        let before = stats;
        let allocation = StatAllocation::default()
            .with(Stat::Strength, 30)
            .with(Stat::Vitality, 11);
        let err = stats.reallocate(&allocation).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientPoints {
                requested: 41,
                available: 40
            }
        );
        assert_eq!(stats, before);
    }

    #[test]
    fn test_reallocate_rejects_unrepresentable_leftover() {
        let mut stats = CharacterStats::new(u32::MAX, u32::MAX, 10, 10, 0);
        let before = stats;
        let err = stats
            .reallocate(&StatAllocation::default().with(Stat::Intelligence, 10))
            .unwrap_err();
        assert_eq!(
            err,
            AllocationError::PointsOverflow {
                remaining: 2 * u64::from(u32::MAX) + 10
            }
        );
        assert_eq!(stats, before);
    }

    #[test]
    fn test_equipment_set_returns_previous() {
        let mut equipment = Equipment::new();
        assert_eq!(equipment.set(EquipmentSlot::Ring1, Some("a".into())), None);
        assert_eq!(
            equipment.set(EquipmentSlot::Ring1, Some("b".into())),
            Some("a".to_string())
        );
        assert_eq!(equipment.slot_of("b"), Some(EquipmentSlot::Ring1));
        equipment.clear_item("b");
        assert_eq!(equipment.occupied(), 0);
    }

    #[test]
    fn test_empty_equipment_serializes_as_empty_object() {
        let json = serde_json::to_string(&Equipment::new()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_placeholder_character() {
        let id = CharacterId::new();
        let character = Character::placeholder(id, UserId::nil());
        assert_eq!(character.id, id);
        assert_eq!(character.name, "New Character");
        assert_eq!(character.class, CharacterClass::Warrior);
        assert_eq!(character.stats.pool(), 40);
    }
}
