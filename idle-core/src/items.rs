//! Items, the inventory grid, and the standard item catalog.
//!
//! Items are referenced by string ids (e.g. `"health-potion"`) so loot tables
//! and equipment slots can name them without holding a copy.

use crate::character::CharacterClass;
use serde::{Deserialize, Serialize};

/// Broad item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Weapon,
    Armor,
    Helmet,
    Boots,
    Gloves,
    Belt,
    Ring,
    Amulet,
    Shield,
    Consumable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemRarity {
    #[default]
    Common,
    Magic,
    Rare,
    Set,
    Unique,
}

/// Numeric bonuses an item grants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_damage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elemental_resistance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffixKind {
    Prefix,
    Suffix,
}

/// A rolled modifier attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAffix {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AffixKind,
    pub tier: u8,
    pub value: f64,
    pub stat_type: String,
}

/// What a character needs before an item can be worn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequirements {
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dexterity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitality: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<Vec<CharacterClass>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub rarity: ItemRarity,
    pub level: u32,
    pub stats: ItemStats,
    pub affixes: Vec<ItemAffix>,
    pub durability: u32,
    pub max_durability: u32,
    pub requirements: ItemRequirements,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_text: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            item_type,
            rarity: ItemRarity::Common,
            level: 1,
            stats: ItemStats::default(),
            affixes: Vec::new(),
            durability: 100,
            max_durability: 100,
            requirements: ItemRequirements {
                level: 1,
                ..Default::default()
            },
            description: String::new(),
            flavor_text: None,
        }
    }

    pub fn with_rarity(mut self, rarity: ItemRarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self.requirements.level = level;
        self
    }

    pub fn with_stats(mut self, stats: ItemStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_flavor(mut self, text: impl Into<String>) -> Self {
        self.flavor_text = Some(text.into());
        self
    }

    pub fn is_consumable(&self) -> bool {
        self.item_type == ItemType::Consumable
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// An item stack in the inventory.
///
/// `position` is the grid cell; `None` means the item is equipped and hidden
/// from the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub item: Item,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl InventoryItem {
    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn is_equipped(&self) -> bool {
        self.position.is_none()
    }
}

/// Ordered, position-addressable item stacks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter()
    }

    /// Total units across all stacks.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Find an item stack by item id.
    pub fn find(&self, item_id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    /// Find an item stack by item id (mutable).
    pub fn find_mut(&mut self, item_id: &str) -> Option<&mut InventoryItem> {
        self.items.iter_mut().find(|i| i.id() == item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.find(item_id).is_some()
    }

    /// Lowest grid cell not taken by any stack.
    pub fn next_free_position(&self) -> u32 {
        self.next_free_position_excluding(None)
    }

    /// Lowest grid cell not taken by any stack other than `ignored`.
    ///
    /// Used when `ignored` is about to leave the grid, so its cell counts as
    /// free.
    pub fn next_free_position_excluding(&self, ignored: Option<&str>) -> u32 {
        let mut taken: Vec<u32> = self
            .items
            .iter()
            .filter(|i| Some(i.id()) != ignored)
            .filter_map(|i| i.position)
            .collect();
        taken.sort_unstable();
        taken.dedup();

        let mut candidate = 0;
        for position in taken {
            if position != candidate {
                break;
            }
            candidate += 1;
        }
        candidate
    }

    /// Add units of an item. Consumables stack with an existing stack of the
    /// same id; everything else gets its own grid cell.
    pub fn add(&mut self, item: Item, quantity: u32) {
        if item.is_consumable() {
            if let Some(existing) = self.find_mut(&item.id) {
                existing.quantity = existing.quantity.saturating_add(quantity);
                return;
            }
        }
        let position = self.next_free_position();
        self.items.push(InventoryItem {
            item,
            quantity,
            position: Some(position),
        });
    }

    /// Remove a whole stack, returning it.
    pub fn remove(&mut self, item_id: &str) -> Option<InventoryItem> {
        let idx = self.items.iter().position(|i| i.id() == item_id)?;
        Some(self.items.remove(idx))
    }
}

impl FromIterator<InventoryItem> for Inventory {
    fn from_iter<I: IntoIterator<Item = InventoryItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

lazy_static::lazy_static! {
    /// Items that can drop from the standard monster loot tables.
    pub static ref ITEMS: Vec<Item> = vec![
        Item::new("health-potion", "Health Potion", ItemType::Consumable)
            .with_stats(ItemStats { health: Some(50.0), ..Default::default() })
            .with_description("Restores 50 health."),
        Item::new("mana-potion", "Mana Potion", ItemType::Consumable)
            .with_stats(ItemStats { mana: Some(40.0), ..Default::default() })
            .with_description("Restores 40 mana."),
        Item::new("iron-sword", "Iron Sword", ItemType::Weapon)
            .with_level(2)
            .with_stats(ItemStats { damage: Some(12.0), attack_speed: Some(1.2), ..Default::default() })
            .with_description("A plain but dependable blade.")
            .with_flavor("Orcs seem to collect these."),
        Item::new("leather-cap", "Leather Cap", ItemType::Helmet)
            .with_stats(ItemStats { armor: Some(3.0), ..Default::default() })
            .with_description("Better than nothing."),
        Item::new("copper-ring", "Copper Ring", ItemType::Ring)
            .with_rarity(ItemRarity::Magic)
            .with_stats(ItemStats { critical_chance: Some(0.02), ..Default::default() })
            .with_description("Faintly warm to the touch."),
    ];
}

/// Look up a catalog item by id.
pub fn get_item(id: &str) -> Option<Item> {
    ITEMS.iter().find(|i| i.id == id).cloned()
}
