//! Fixtures for tests.
//!
//! Deterministic game states and RNGs so resolver behavior can be asserted
//! without depending on `thread_rng`.

use crate::id::{CharacterId, UserId};
use crate::items::{get_item, Inventory, InventoryItem, Item};
use crate::state::GameState;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A reproducible RNG.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A fresh placeholder state with nil ids.
pub fn sample_state() -> GameState {
    GameState::placeholder(CharacterId::nil(), UserId::nil())
}

fn catalog(id: &str) -> Item {
    get_item(id).unwrap_or_else(|| panic!("catalog is missing {id}"))
}

/// A state whose grid holds, in cells 0 to 3:
/// two health potions, an iron sword, a leather cap and a copper ring.
pub fn stocked_state() -> GameState {
    let inventory: Inventory = [
        ("health-potion", 2),
        ("iron-sword", 1),
        ("leather-cap", 1),
        ("copper-ring", 1),
    ]
    .into_iter()
    .zip(0u32..)
    .map(|((id, quantity), position)| InventoryItem {
        item: catalog(id),
        quantity,
        position: Some(position),
    })
    .collect();
    sample_state().with_inventory(inventory)
}
