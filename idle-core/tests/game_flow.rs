//! End-to-end game flow through the public API.
//!
//! Covers the path a player takes after creating a character:
//! - Game state seeded from the roster
//! - Combat start and stop
//! - Equipping and consuming items
//! - Spending stat points

use idle_core::items::get_item;
use idle_core::rules::{ActionOutcome, StatRaised};
use idle_core::{
    Action, ActionError, ActionRequest, AllocationError, Character, CharacterClass,
    CharacterStats, CharacterUpdate, CharacterId, EquipmentSlot, GameError, GameService,
    GameState, MemoryStore, Roster, RosterError, Stat, StatAllocation, Store, UserId,
};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// HELPERS
// =============================================================================

struct World {
    roster: Roster,
    game: GameService,
    states: Arc<MemoryStore<CharacterId, GameState>>,
}

fn world() -> World {
    let states: Arc<MemoryStore<CharacterId, GameState>> = Arc::new(MemoryStore::new());
    World {
        roster: Roster::new(Arc::new(MemoryStore::new())),
        game: GameService::new(states.clone()),
        states,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test]
async fn test_roster_character_seeds_game_state() {
    let world = world();
    let user = UserId::new();
    let paladin = world
        .roster
        .create(user, "Lancelot", CharacterClass::Paladin)
        .await
        .unwrap();

    let seed = world.roster.get(user, paladin.id).await.ok();
    let state = world.game.state(user, paladin.id, seed).await.unwrap();
    assert_eq!(state.character.name, "Lancelot");
    assert_eq!(state.character.stats, CharacterStats::new(12, 10, 12, 11, 0));
    assert!(!state.in_combat());
}

#[tokio::test]
async fn test_combat_round_trip() {
    let world = world();
    let user = UserId::new();
    let hero = world
        .roster
        .create(user, "Hero", CharacterClass::Warrior)
        .await
        .unwrap();
    world.game.state(user, hero.id, Some(hero.clone())).await.unwrap();

    let started = world
        .game
        .perform(user, hero.id, &Action::start_combat(Some("crypt")))
        .await
        .unwrap();
    let ActionOutcome::CombatStarted(started) = started else {
        panic!("combat did not start");
    };
    // Level 1 characters meet monsters up to level 3.
    assert!(started.monster.level <= 3);

    let stopped = world
        .game
        .perform(user, hero.id, &Action::StopCombat)
        .await
        .unwrap();
    assert!(matches!(stopped, ActionOutcome::CombatStopped(_)));

    let err = world
        .game
        .perform(user, hero.id, &Action::StopCombat)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Action(ActionError::NotInCombat)));
}

#[tokio::test]
async fn test_items_and_stat_points() {
    let world = world();
    let user = UserId::new();
    let hero = world
        .roster
        .create(user, "Hero", CharacterClass::Rogue)
        .await
        .unwrap();
    let hero = world
        .roster
        .update(
            user,
            hero.id,
            CharacterUpdate {
                name: None,
                stats: Some(
                    StatAllocation::default()
                        .with(Stat::Strength, 10)
                        .with(Stat::Dexterity, 14)
                        .with(Stat::Intelligence, 10)
                        .with(Stat::Vitality, 10),
                ),
            },
        )
        .await
        .unwrap();
    assert_eq!(hero.stats.available_points, 1);

    // Give the state something to equip and drink.
    let mut state = world.game.state(user, hero.id, Some(hero.clone())).await.unwrap();
    state.inventory.add(get_item("iron-sword").unwrap(), 1);
    state.inventory.add(get_item("mana-potion").unwrap(), 1);
    world.states.put(&hero.id, state).await.unwrap();

    world
        .game
        .perform(user, hero.id, &Action::equip("iron-sword", "weapon"))
        .await
        .unwrap();
    world
        .game
        .perform(user, hero.id, &Action::use_item("mana-potion"))
        .await
        .unwrap();
    let outcome = world
        .game
        .perform(user, hero.id, &Action::level_up("dexterity"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::StatRaised(StatRaised {
            level_up: true,
            stat: Stat::Dexterity,
            new_value: 15,
            remaining_points: 0,
        })
    );

    let state = world.game.state(user, hero.id, None).await.unwrap();
    assert_eq!(
        state.character.equipment.get(EquipmentSlot::Weapon),
        Some("iron-sword")
    );
    assert!(!state.inventory.contains("mana-potion"));
    assert_eq!(state.character.stats.available_points, 0);

    // Game state and roster are independent copies.
    let roster_copy = world.roster.get(user, hero.id).await.unwrap();
    assert_eq!(roster_copy.stats.dexterity, 14);
}

#[tokio::test]
async fn test_inflated_stats_stay_bounded() {
    let world = world();
    let user = UserId::new();
    let mut hero = world
        .roster
        .create(user, "Hero", CharacterClass::Rogue)
        .await
        .unwrap();

    // Assigning the whole pool to one stat at a time grows the pool, since
    // untouched stats keep their value. Eventually the leftover no longer
    // fits and the update is refused.
    let mut refused = false;
    for stat in Stat::all().into_iter().cycle().take(64) {
        let value = u32::try_from(hero.stats.pool()).unwrap_or(u32::MAX);
        let update = CharacterUpdate {
            name: None,
            stats: Some(StatAllocation::default().with(stat, value)),
        };
        match world.roster.update(user, hero.id, update).await {
            Ok(updated) => hero = updated,
            Err(RosterError::Allocation(AllocationError::PointsOverflow { .. })) => {
                refused = true;
                break;
            }
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert!(refused);
    assert_eq!(world.roster.get(user, hero.id).await.unwrap().stats, hero.stats);

    let maxed = Stat::all()
        .into_iter()
        .find(|stat| hero.stats.get(*stat) == u32::MAX)
        .unwrap();
    assert!(hero.stats.available_points > 0);

    world.game.state(user, hero.id, Some(hero.clone())).await.unwrap();
    let err = world
        .game
        .perform(user, hero.id, &Action::level_up(maxed.name()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::Action(ActionError::StatAtMaximum { stat }) if stat == maxed
    ));
    let state = world.game.state(user, hero.id, None).await.unwrap();
    assert_eq!(state.character.stats, hero.stats);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_level_ups_are_not_lost() {
    const CONTENDERS: u32 = 8;

    // Each failed write means another contender's write landed, so this
    // limit lets every contender through eventually.
    let game = Arc::new(
        GameService::new(Arc::new(MemoryStore::new())).with_retry_limit(CONTENDERS),
    );
    let user = UserId::new();
    let mut hero = Character::new(user, "Hero", CharacterClass::Warrior);
    hero.stats.available_points = CONTENDERS;
    let strength = hero.stats.strength;
    game.state(user, hero.id, Some(hero.clone())).await.unwrap();

    let tasks: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let game = Arc::clone(&game);
            let id = hero.id;
            tokio::spawn(async move {
                game.perform(user, id, &Action::level_up("strength")).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stats = game.state(user, hero.id, None).await.unwrap().character.stats;
    assert_eq!(stats.strength, strength + CONTENDERS);
    assert_eq!(stats.available_points, 0);
}

#[tokio::test]
async fn test_raw_requests_are_decoded() {
    let world = world();
    let user = UserId::new();
    let id = CharacterId::new();
    world.game.state(user, id, None).await.unwrap();

    let outcome = world
        .game
        .dispatch(
            user,
            id,
            ActionRequest {
                action: "startCombat".into(),
                data: Some(json!({"area": "swamp"})),
            },
        )
        .await
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["combatStarted"], true);
    assert!(json["monster"]["id"].is_string());

    let err = world
        .game
        .dispatch(
            user,
            id,
            ActionRequest {
                action: "equipItem".into(),
                data: Some(json!({"slot": "weapon"})),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::Action(ActionError::InvalidPayload { .. })
    ));
}
