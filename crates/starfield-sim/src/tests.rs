//! Tests for the simulation loop, collisions, scheduling and replication.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use starfield_core::commands::Command;
use starfield_core::delta::DeltaTracker;
use starfield_core::entity::{Bullet, Entity, EntityBase, Player, Powerup};
use starfield_core::enums::*;
use starfield_core::events::{DESTROY, HIT, POWERUP};
use starfield_core::state::SavedState;
use starfield_core::vector::Vec3;

use crate::engine::{Game, GameConfig, SpawnError};
use crate::systems::collision;
use crate::world_setup;

fn quiet_config() -> GameConfig {
    GameConfig {
        bot_count: 0,
        asteroid_count: 0,
        powerup_count: 0,
        ..GameConfig::default()
    }
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn player_at(id: &str, x: f64, y: f64) -> Player {
    let mut p = Player::new(id, PlayerSubtype::Player);
    p.base.pos = Vec3::new(x, y, 0.0);
    p.base.last_pos = p.base.pos;
    p
}

fn press(space: u8) -> Command {
    Command {
        space: Some(space),
        ..Command::default()
    }
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let mut game_a = Game::new(GameConfig { seed: 7, ..GameConfig::default() });
    let mut game_b = Game::new(GameConfig { seed: 7, ..GameConfig::default() });
    world_setup::seed_level(&mut game_a);
    world_setup::seed_level(&mut game_b);

    for _ in 0..200 {
        let a = serde_json::to_string(&game_a.tick()).unwrap();
        let b = serde_json::to_string(&game_b.tick()).unwrap();
        assert_eq!(a, b, "deltas diverged with same seed");
    }
}

#[test]
fn test_different_seeds_differ() {
    let mut game_a = Game::new(GameConfig { seed: 1, ..GameConfig::default() });
    let mut game_b = Game::new(GameConfig { seed: 2, ..GameConfig::default() });
    world_setup::seed_level(&mut game_a);
    world_setup::seed_level(&mut game_b);
    assert_ne!(
        serde_json::to_string(&game_a.save()).unwrap(),
        serde_json::to_string(&game_b.save()).unwrap()
    );
}

// ---- Collisions ----

#[test]
fn test_equal_mass_players_swap_velocities() {
    let mut a = player_at("a", 0.0, 0.0);
    let mut b = player_at("b", 1.0, 0.0);
    a.base.radius = 1.0;
    b.base.radius = 1.0;
    a.base.velocity = Vec3::new(1.0, 0.0, 0.0);
    b.base.velocity = Vec3::new(-1.0, 0.0, 0.0);
    let (mut a, mut b) = (Entity::Player(a), Entity::Player(b));

    let mut sink = DeltaTracker::new();
    let mut effects = Vec::new();
    assert!(collision::resolve(&mut a, &mut b, 33.0, &mut sink, &mut effects));

    let (va, vb) = (a.base().velocity, b.base().velocity);
    assert!((va - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-12, "got {va:?}");
    assert!((vb - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-12, "got {vb:?}");

    let state = sink.take();
    assert!(state.entry("entities", "a").unwrap().contains_key("velocity"));
    assert!(state.entry("entities", "b").unwrap().contains_key("velocity"));
    assert!(state.events.iter().any(|e| e.name == "collision" && e.entity_id == "a"));
}

#[test]
fn test_bullet_hit_reduces_shield() {
    let mut game = Game::new(quiet_config());
    let mut target = player_at("target", 500.0, 500.0);
    target.shield_quality = 0.5;
    game.queue_entity(Entity::Player(target)).unwrap();

    let mut bullet = Bullet::fired("shot", "ghost", Vec3::new(505.0, 500.0, 0.0), Vec3::ZERO);
    bullet.strength = 30.0;
    game.queue_entity(Entity::Bullet(bullet)).unwrap();

    game.tick();

    let player = game.get_player("target").unwrap();
    assert_eq!(player.shield, 85.0);
    assert!(!game.entity_exists("shot"), "bullet should be compacted away");

    let delta = game.last_delta();
    assert_eq!(delta.entry("entities", "shot").unwrap()["remove"], json!(true));
    let hit = delta.events.iter().find(|e| e.name == HIT).unwrap();
    assert_eq!(hit.entity_id, "target");
    assert_eq!(hit.args, vec![json!("shot"), json!("ghost")]);
}

#[test]
fn test_bullet_ignores_its_owner() {
    let mut game = Game::new(quiet_config());
    game.queue_entity(Entity::Player(player_at("ace", 500.0, 500.0))).unwrap();
    let bullet = Bullet::fired("own", "ace", Vec3::new(500.0, 500.0, 0.0), Vec3::ZERO);
    game.queue_entity(Entity::Bullet(bullet)).unwrap();

    game.tick();
    assert!(game.entity_exists("own"));
    assert_eq!(game.get_player("ace").unwrap().shield, 100.0);
}

#[test]
fn test_fast_bullet_does_not_tunnel() {
    let mut game = Game::new(quiet_config());
    game.queue_entity(Entity::Player(player_at("target", 1000.0, 500.0))).unwrap();
    // Crosses the target within one tick without overlapping at either end.
    let bullet = Bullet::fired(
        "fast",
        "ghost",
        Vec3::new(950.0, 500.0, 0.0),
        Vec3::new(3.0, 0.0, 0.0),
    );
    game.queue_entity(Entity::Bullet(bullet)).unwrap();

    game.tick();
    assert!(!game.entity_exists("fast"));
    assert!(game.get_player("target").unwrap().shield < 100.0);
}

#[test]
fn test_asteroid_hit_drains_health() {
    let mut game = Game::new(quiet_config());
    let rock = Entity::Asteroid(starfield_core::entity::Asteroid::from_params(&params(json!({
        "id": "rock", "pos": [800.0, 800.0, 0.0], "angularVelocity": 0.0
    }))));
    let health = rock.as_asteroid().unwrap().health;
    game.queue_entity(rock).unwrap();
    let bullet = Bullet::fired("b", "ghost", Vec3::new(800.0, 800.0, 0.0), Vec3::ZERO);
    game.queue_entity(Entity::Bullet(bullet)).unwrap();

    game.tick();
    let rock = game.get_entity("rock").unwrap().as_asteroid().unwrap();
    assert_eq!(rock.health, health - 5.0);
}

#[test]
fn test_shield_powerup_pickup() {
    let mut game = Game::new(quiet_config());
    game.join("ace", Some(&params(json!({"pos": [600.0, 600.0], "shield": 80})))).unwrap();
    let powerup = Powerup::new("pw", PowerupKind::Shield, Vec3::new(600.0, 600.0, 0.0));
    game.queue_entity(Entity::Powerup(powerup)).unwrap();

    game.tick();

    assert_eq!(game.get_player("ace").unwrap().shield, 100.0);
    assert!(!game.entity_exists("pw"));
    let event = game
        .last_delta()
        .events
        .iter()
        .find(|e| e.name == POWERUP)
        .unwrap();
    assert_eq!(event.args, vec![json!("shield"), json!("ace")]);
}

#[test]
fn test_shieldup_reverts_after_duration() {
    let mut game = Game::new(quiet_config());
    game.join("ace", Some(&params(json!({"pos": [600.0, 600.0]})))).unwrap();
    let powerup = Powerup::new("pw", PowerupKind::ShieldUp, Vec3::new(600.0, 600.0, 0.0));
    game.queue_entity(Entity::Powerup(powerup)).unwrap();

    game.tick();
    let ace = game.get_player("ace").unwrap();
    assert_eq!(ace.shield_max, 130.0);
    assert_eq!(ace.shield, 130.0);
    assert_eq!(game.scheduled_tasks(), 1);

    let later = game.time_stamp() + 15_000.0;
    game.update(later);
    let ace = game.get_player("ace").unwrap();
    assert_eq!(ace.shield_max, 100.0);
    assert_eq!(ace.shield, 100.0);
    assert_eq!(game.scheduled_tasks(), 0);
}

#[test]
fn test_powerup_ignores_asteroids() {
    let mut game = Game::new(quiet_config());
    let rock = starfield_core::entity::Asteroid::from_params(&params(json!({
        "id": "rock", "pos": [700.0, 700.0, 0.0]
    })));
    game.queue_entity(Entity::Asteroid(rock)).unwrap();
    let powerup = Powerup::new("pw", PowerupKind::Shield, Vec3::new(700.0, 700.0, 0.0));
    game.queue_entity(Entity::Powerup(powerup)).unwrap();

    game.tick();
    assert!(game.entity_exists("pw"));
}

// ---- Scheduler ----

#[test]
fn test_repeating_task_cancels_after_false() {
    let mut game = Game::new(GameConfig {
        tick_rate_hz: 5.0,
        ..quiet_config()
    });
    assert_eq!(game.config().tick_ms(), 200.0);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    game.schedule(
        move |_, _, _| counter.fetch_add(1, Ordering::SeqCst) + 1 < 4,
        200.0,
        true,
    );

    for _ in 0..3 {
        game.tick();
        assert_eq!(game.scheduled_tasks(), 1);
    }
    game.tick();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(game.scheduled_tasks(), 0);
    assert!(game.time_stamp() >= 600.0);
}

#[test]
fn test_scheduled_task_sees_game() {
    let mut game = Game::new(quiet_config());
    game.schedule(
        |game, _, _| {
            let _ = game.add_bot("late");
            false
        },
        50.0,
        false,
    );
    game.tick();
    assert!(!game.player_exists("late"));
    game.tick();
    assert!(game.player_exists("late"));
}

// ---- Spawning and lifecycle ----

#[test]
fn test_shoot_spawns_owned_bullet() {
    let mut game = Game::new(quiet_config());
    game.join("p", Some(&params(json!({"pos": [100.0, 100.0, 0.0], "angle": 0.0})))).unwrap();

    let before = game.entities().len();
    let id = game.shoot("p").unwrap();
    assert_eq!(game.entities().len(), before + 1);

    let bullet = game.get_entity(&id).unwrap().as_bullet().unwrap();
    assert_eq!(bullet.owner, "p");
    assert!((bullet.base.pos - Vec3::new(100.0, 100.0, 0.0)).length() < 1e-9);
    assert!(bullet.base.velocity.y > 0.0);

    let record = game.pending_delta().entry("entities", &id).unwrap();
    assert_eq!(record["type"], json!("bullet"));
    assert_eq!(record["owner"], json!("p"));

    // Registered between ticks, so it ships with the next tick.
    game.tick();
    assert!(game.last_delta().entry("entities", &id).is_some());
}

#[test]
fn test_predicted_shot_origin() {
    let mut game = Game::new(GameConfig {
        shot_origin: ShotOrigin::Predicted,
        ..quiet_config()
    });
    game.join("p", Some(&params(json!({"pos": [100.0, 100.0], "velocity": [0.1, 0.0]})))).unwrap();
    let id = game.shoot("p").unwrap();
    let bullet = game.get_entity(&id).unwrap();
    assert!((bullet.base().pos.x - (100.0 + 0.1 * 33.0)).abs() < 1e-9);
}

#[test]
fn test_duplicate_join_is_refused() {
    let mut game = Game::new(quiet_config());
    game.join("ace", None).unwrap();
    assert_eq!(
        game.join("ace", None).unwrap_err(),
        SpawnError::NameInUse("ace".into())
    );
    assert_eq!(game.add_bot("").unwrap_err(), SpawnError::EmptyId);
    assert_eq!(game.entities().len(), 1);
}

#[test]
fn test_player_exists_only_for_players() {
    let mut game = Game::new(quiet_config());
    game.add_bot("bot_a").unwrap();
    let rock = starfield_core::entity::Asteroid::from_params(&params(json!({"id": "rock"})));
    game.queue_entity(Entity::Asteroid(rock)).unwrap();

    assert!(game.player_exists("bot_a"));
    assert!(game.entity_exists("rock"));
    assert!(!game.player_exists("rock"));
    assert!(game.get_entity("missing").is_none());
}

#[test]
fn test_leave_destroys_once() {
    let mut game = Game::new(quiet_config());
    game.join("ace", Some(&params(json!({"pos": [300.0, 300.0]})))).unwrap();
    game.tick();

    assert!(game.leave("ace"));
    assert!(!game.leave("ace"));
    game.tick();

    let delta = game.last_delta();
    assert_eq!(delta.entry("entities", "ace").unwrap()["remove"], json!(true));
    let destroys = delta
        .events
        .iter()
        .filter(|e| e.name == DESTROY && e.entity_id == "ace")
        .count();
    assert_eq!(destroys, 1);
    assert!(!game.entity_exists("ace"));
    assert!(game.entity_index().is_empty());
}

#[test]
fn test_entity_map_matches_after_compaction() {
    let mut game = Game::new(quiet_config());
    for id in ["a", "b", "c", "d"] {
        game.add_bot(id).unwrap();
    }
    game.leave("b");
    game.tick();

    for (id, index) in game.entity_index() {
        assert_eq!(game.entities()[index].id(), id);
    }
    assert_eq!(game.entities().len(), 3);
}

#[test]
fn test_bot_seeding_schedule() {
    let mut game = Game::new(GameConfig {
        bot_count: 3,
        ..quiet_config()
    });
    world_setup::seed_level(&mut game);
    assert_eq!(game.scheduled_tasks(), 1);

    for step in 1..=4 {
        game.update(step as f64 * 1000.0);
    }
    assert_eq!(game.bot_count(), 3);
    assert_eq!(game.scheduled_tasks(), 0);
}

#[test]
fn test_update_counter_and_clock() {
    let mut game = Game::new(quiet_config());
    game.update(33.0);
    game.update(10.0);
    assert_eq!(game.update_count(), 2);
    assert_eq!(game.time_stamp(), 33.0);
}

// ---- Commands ----

#[test]
fn test_hold_fire_then_release() {
    let mut game = Game::new(quiet_config());
    game.join("ace", Some(&params(json!({"pos": [1250.0, 1250.0]})))).unwrap();

    game.queue_command("ace", [press(1)]);
    game.tick();
    let bullets = |g: &Game| g.entities().iter().filter(|e| e.kind() == EntityKind::Bullet).count();
    assert_eq!(bullets(&game), 1);
    assert_eq!(game.scheduled_tasks(), 1);

    // A second press while held does not arm another task.
    game.queue_command("ace", [press(1)]);
    for _ in 0..10 {
        game.tick();
    }
    assert_eq!(game.scheduled_tasks(), 1);
    assert!(bullets(&game) > 1);

    game.queue_command("ace", [press(0)]);
    for _ in 0..10 {
        game.tick();
    }
    assert_eq!(game.scheduled_tasks(), 0);
}

#[test]
fn test_thrust_and_turn_commands() {
    let mut game = Game::new(quiet_config());
    game.join("ace", Some(&params(json!({"pos": [1250.0, 1250.0]})))).unwrap();
    game.queue_command(
        "ace",
        [Command {
            up: Some(1),
            right: Some(1),
            ..Command::default()
        }],
    );
    game.tick();

    let p = game.get_player("ace").unwrap();
    assert!(p.accelerating);
    assert_eq!(p.rotation, 1);
    assert!(p.base.angle > 0.0);
    assert!(p.base.velocity.length() > 0.0);
}

#[test]
fn test_commands_for_unknown_ids_are_dropped() {
    let mut game = Game::new(quiet_config());
    game.queue_command("nobody", [press(1)]);
    game.tick();
    game.join("nobody", None).unwrap();
    game.tick();
    assert_eq!(game.scheduled_tasks(), 0);
}

// ---- Boundaries ----

#[test]
fn test_boundary_policy_per_type() {
    let mut game = Game::new(quiet_config());
    let stray = Bullet::fired("stray", "ghost", Vec3::new(-50.0, 100.0, 0.0), Vec3::ZERO);
    game.queue_entity(Entity::Bullet(stray)).unwrap();
    game.queue_entity(Entity::Player(player_at("drifter", -50.0, 400.0))).unwrap();

    game.tick();
    assert!(!game.entity_exists("stray"));
    let drifter = game.get_player("drifter").unwrap();
    assert!((drifter.base.pos.x - (2500.0 - 50.0 + 2.0 * 18.0)).abs() < 1e-9);
}

// ---- Replication ----

#[test]
fn test_save_load_roundtrip() {
    let mut game = Game::new(GameConfig::default());
    world_setup::seed_level(&mut game);
    game.join("ace", None).unwrap();
    for _ in 0..40 {
        game.tick();
    }
    let saved = game.save();

    let mut copy = Game::new(GameConfig::default());
    copy.load(&saved);

    assert_eq!(copy.time_stamp(), game.time_stamp());
    assert_eq!(copy.entities().len(), game.entities().len());
    for entity in game.entities() {
        let other = copy.get_entity(entity.id()).unwrap();
        assert_eq!(other.kind(), entity.kind());
        assert_eq!(other.subtype(), entity.subtype());
        assert_eq!(other.base().pos, entity.base().pos);
    }
    assert_eq!(copy.save(), saved);
}

#[test]
fn test_load_skips_unknown_kinds() {
    let mut state = SavedState::default();
    state.entities.push(params(json!({"type": "planet", "subtype": "gas", "id": "x"})));
    state.entities.push(params(json!({
        "type": "player", "subtype": "bot", "id": "b", "pos": [1, 2]
    })));

    let mut game = Game::new(quiet_config());
    game.load(&state);
    assert_eq!(game.entities().len(), 1);
    assert!(game.player_exists("b"));
}

#[test]
fn test_replica_follows_deltas() {
    let mut server = Game::new(GameConfig::default());
    world_setup::seed_level(&mut server);
    server.join("ace", Some(&params(json!({"pos": [1250.0, 1250.0]})))).unwrap();
    server.tick();

    let mut replica = Game::new(GameConfig::default());
    replica.load(&server.full_snapshot().state);

    let destroyed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&destroyed);
    replica
        .events_mut()
        .bind(DESTROY, move |e| sink.lock().unwrap().push(e.entity_id.clone()));

    server.queue_command("ace", [press(1)]);
    for _ in 0..30 {
        let snapshot = server.tick();
        replica.apply_delta_snapshot(&snapshot);
    }
    server.leave("ace");
    replica.apply_delta_snapshot(&server.tick());

    assert!(!replica.entity_exists("ace"));
    assert!(destroyed.lock().unwrap().contains(&"ace".to_string()));
    let mut server_ids: Vec<&str> = server.entities().iter().map(Entity::id).collect();
    let mut replica_ids: Vec<&str> = replica.entities().iter().map(Entity::id).collect();
    server_ids.sort_unstable();
    replica_ids.sort_unstable();
    assert_eq!(server_ids, replica_ids);
    let server_player_ids: Vec<&str> = server
        .entities()
        .iter()
        .filter(|e| e.kind() == EntityKind::Player)
        .map(Entity::id)
        .collect();
    for id in server_player_ids {
        let (a, b) = (server.get_entity(id).unwrap(), replica.get_entity(id).unwrap());
        assert!((a.base().pos - b.base().pos).length() < 1e-9);
    }
}

#[test]
fn test_apply_delta_skips_partial_unknown_entity() {
    let mut replica = Game::new(quiet_config());
    let delta = serde_json::from_value(json!({
        "entities": {"ghost": {"pos": [1.0, 2.0, 0.0]}},
        "events": [["hit", "ghost", "b", "o"]]
    })).unwrap();
    replica.apply_delta(&delta);
    assert!(replica.entities().is_empty());
}

#[test]
fn test_load_discards_pending_input_and_tasks() {
    let mut game = Game::new(quiet_config());
    game.join("ace", Some(&params(json!({"pos": [600.0, 600.0]})))).unwrap();
    game.tick();
    let saved = game.save();

    // Arm auto-fire, then leave input and a task pending.
    game.queue_command("ace", [press(1)]);
    game.tick();
    assert_eq!(game.scheduled_tasks(), 1);
    let thrust = Command {
        up: Some(1),
        ..Command::default()
    };
    game.queue_command("ace", [thrust]);
    game.schedule(|_, _, _| true, 10.0, true);

    game.load(&saved);
    assert_eq!(game.scheduled_tasks(), 0);
    assert!(game.pending_delta().is_empty());

    game.tick();
    let ace = game.get_player("ace").unwrap();
    assert!(!ace.accelerating);
    assert!(!ace.shooting);
    assert_eq!(game.entities().len(), 1);

    // Auto-fire can be armed again in the loaded world.
    game.queue_command("ace", [press(1)]);
    game.tick();
    assert_eq!(game.scheduled_tasks(), 1);
}

#[test]
fn test_replica_shield_follows_raised_max() {
    let mut server = Game::new(quiet_config());
    server
        .join("ace", Some(&params(json!({"pos": [600.0, 600.0], "shield": 70}))))
        .unwrap();
    server.tick();

    let mut replica = Game::new(quiet_config());
    replica.load(&server.full_snapshot().state);

    let powerup = Powerup::new("pw", PowerupKind::ShieldUp, Vec3::new(600.0, 600.0, 0.0));
    server.queue_entity(Entity::Powerup(powerup)).unwrap();
    for _ in 0..3 {
        let snapshot = server.tick();
        replica.apply_delta_snapshot(&snapshot);
    }
    let (theirs, ours) = (server.get_player("ace").unwrap(), replica.get_player("ace").unwrap());
    assert_eq!(ours.shield_max, 130.0);
    assert_eq!(ours.shield, theirs.shield);

    let delta = serde_json::from_value(json!({
        "entities": {"ace": {"shield": 120, "shieldMax": 140}}
    })).unwrap();
    replica.apply_delta(&delta);
    let ours = replica.get_player("ace").unwrap();
    assert_eq!(ours.shield_max, 140.0);
    assert_eq!(ours.shield, 120.0);
}

#[test]
fn test_replica_fires_events_in_registration_order() {
    let mut replica = Game::new(quiet_config());
    replica
        .join("a", Some(&params(json!({"pos": [300.0, 300.0]}))))
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in [HIT, DESTROY, POWERUP] {
        let seen = Arc::clone(&seen);
        replica.events_mut().bind(name, move |e| {
            seen.lock()
                .unwrap()
                .push(format!("{}:{}", e.name, e.entity_id));
        });
    }

    let delta = serde_json::from_value(json!({
        "entities": {"a": {"remove": true}},
        "events": [
            ["hit", "a", "s1", "o"],
            ["destroy", "s1"],
            ["powerup", "pw", "shield", "b"],
            ["destroy", "a"],
            ["hit", "b", "s2", "o"]
        ]
    })).unwrap();
    replica.apply_delta(&delta);

    // Entity changes land before any handler runs.
    assert!(!replica.entity_exists("a"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["hit:a", "destroy:s1", "powerup:pw", "destroy:a", "hit:b"]
    );
}

// ---- Properties ----

fn mover(id: &str, pos: (f64, f64), vel: (f64, f64), mass: f64) -> EntityBase {
    EntityBase {
        pos: Vec3::new(pos.0, pos.1, 0.0),
        velocity: Vec3::new(vel.0, vel.1, 0.0),
        mass,
        ..EntityBase::new(id)
    }
}

proptest! {
    #[test]
    fn prop_elastic_impulse_conserves_momentum(
        p1 in (-100.0..100.0f64, -100.0..100.0f64),
        p2 in (-100.0..100.0f64, -100.0..100.0f64),
        v1 in (-5.0..5.0f64, -5.0..5.0f64),
        v2 in (-5.0..5.0f64, -5.0..5.0f64),
        m1 in 0.1..10.0f64,
        m2 in 0.1..10.0f64,
    ) {
        let mut a = mover("a", p1, v1, m1);
        let mut b = mover("b", p2, v2, m2);
        let before = a.velocity * m1 + b.velocity * m2;

        let mut sink = DeltaTracker::new();
        collision::elastic_impulse(&mut a, &mut b, &mut sink);

        let after = a.velocity * m1 + b.velocity * m2;
        prop_assert!((before - after).length() < 1e-9, "before {:?} after {:?}", before, after);
    }
}
