//! Monster templates and their loot tables.
//!
//! Templates are read-only; combat works on a copy so an encounter never
//! damages the template.

use serde::{Deserialize, Serialize};

/// One possible drop from a monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootEntry {
    pub item_id: String,
    pub drop_rate: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<u32>,
}

impl LootEntry {
    pub fn new(item_id: impl Into<String>, drop_rate: f64, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            drop_rate,
            quantity,
            min_level: None,
            max_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEffect {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: u32,
    pub value: f64,
    pub is_debuff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterAbility {
    pub name: String,
    pub damage: u32,
    pub cooldown: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<StatusEffect>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub health: u32,
    pub max_health: u32,
    pub damage: u32,
    pub defense: u32,
    pub attack_speed: f64,
    pub experience: u64,
    pub loot_table: Vec<LootEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abilities: Option<Vec<MonsterAbility>>,
}

impl Monster {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: u32, health: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            health,
            max_health: health,
            damage: 1,
            defense: 0,
            attack_speed: 1.0,
            experience: 0,
            loot_table: Vec::new(),
            abilities: None,
        }
    }

    pub fn with_combat(mut self, damage: u32, defense: u32, attack_speed: f64) -> Self {
        self.damage = damage;
        self.defense = defense;
        self.attack_speed = attack_speed;
        self
    }

    pub fn with_experience(mut self, experience: u64) -> Self {
        self.experience = experience;
        self
    }

    pub fn with_loot(mut self, loot: Vec<LootEntry>) -> Self {
        self.loot_table = loot;
        self
    }

    /// Whether a character of `character_level` may encounter this monster.
    pub fn is_eligible_for(&self, character_level: u32) -> bool {
        self.level <= character_level.saturating_add(2)
    }
}

lazy_static::lazy_static! {
    /// The standard encounter table.
    pub static ref MONSTERS: Vec<Monster> = vec![
        Monster::new("goblin-1", "Goblin Warrior", 1, 50)
            .with_combat(8, 2, 1.5)
            .with_experience(25)
            .with_loot(vec![
                LootEntry::new("gold-coin", 0.8, 5),
                LootEntry::new("health-potion", 0.3, 1),
            ]),
        Monster::new("orc-1", "Orc Berserker", 3, 120)
            .with_combat(18, 5, 1.2)
            .with_experience(60)
            .with_loot(vec![
                LootEntry::new("gold-coin", 0.9, 12),
                LootEntry::new("health-potion", 0.4, 1),
                LootEntry::new("iron-sword", 0.1, 1),
            ]),
        Monster::new("skeleton-1", "Skeleton Archer", 2, 80)
            .with_combat(12, 3, 2.0)
            .with_experience(40)
            .with_loot(vec![
                LootEntry::new("gold-coin", 0.7, 8),
                LootEntry::new("mana-potion", 0.3, 1),
            ]),
    ];
}

/// Look up a monster template by id.
pub fn get_monster(id: &str) -> Option<Monster> {
    MONSTERS.iter().find(|m| m.id == id).cloned()
}
