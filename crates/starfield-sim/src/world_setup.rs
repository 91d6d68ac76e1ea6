//! Level seeding: asteroids, powerups and a staggered bot roster.
//!
//! Uses only the public spawn primitives and the game's seeded RNG, so a
//! given seed always produces the same layout.

use rand::Rng;
use tracing::info;

use starfield_core::constants::{
    ASTEROID_HEALTH_PER_RADIUS, ASTEROID_MASS_PER_RADIUS, BOT_SPAWN_INTERVAL_MS,
};
use starfield_core::entity::{Asteroid, Entity, Powerup};
use starfield_core::enums::PowerupKind;
use starfield_core::vector::Vec3;

use crate::engine::Game;

/// Populate a fresh world from the game's config.
pub fn seed_level(game: &mut Game) {
    let (asteroids, powerups) = (game.config().asteroid_count, game.config().powerup_count);
    for _ in 0..asteroids {
        spawn_asteroid(game);
    }
    for n in 0..powerups {
        let kind = if n % 2 == 0 {
            PowerupKind::Shield
        } else {
            PowerupKind::ShieldUp
        };
        spawn_powerup(game, kind);
    }
    schedule_bots(game);
    info!(asteroids, powerups, bots = game.config().bot_count, "level seeded");
}

/// Spawn one asteroid with a random size, position and drift.
pub fn spawn_asteroid(game: &mut Game) -> Option<String> {
    let id = game.next_id("asteroid");
    let pos = game.random_position();
    let rng = game.rng_mut();
    let radius: f64 = rng.gen_range(12.0..40.0);
    let velocity = Vec3::new(rng.gen_range(-0.05..0.05), rng.gen_range(-0.05..0.05), 0.0);
    let spin = rng.gen_range(-0.002..0.002);

    let mut asteroid = Asteroid::default();
    asteroid.base.id = id.clone();
    asteroid.base.pos = pos;
    asteroid.base.last_pos = pos;
    asteroid.base.velocity = velocity;
    asteroid.base.radius = radius;
    asteroid.base.angular_velocity = spin;
    asteroid.base.mass = radius * ASTEROID_MASS_PER_RADIUS;
    asteroid.health = radius * ASTEROID_HEALTH_PER_RADIUS;

    game.queue_entity(Entity::Asteroid(asteroid)).ok().map(|_| id)
}

pub fn spawn_powerup(game: &mut Game, kind: PowerupKind) -> Option<String> {
    let id = game.next_id("powerup");
    let pos = game.random_position();
    game.queue_entity(Entity::Powerup(Powerup::new(id.clone(), kind, pos)))
        .ok()
        .map(|_| id)
}

/// Add one bot per second until `botCount` bots are alive.
pub fn schedule_bots(game: &mut Game) {
    let target = game.config().bot_count as usize;
    if target == 0 {
        return;
    }
    game.schedule(
        move |game, _, _| {
            if game.bot_count() < target {
                let id = game.next_id("bot");
                let _ = game.add_bot(&id);
            }
            game.bot_count() < target
        },
        BOT_SPAWN_INTERVAL_MS,
        true,
    );
}
