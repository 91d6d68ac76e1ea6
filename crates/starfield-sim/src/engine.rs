//! Simulation loop: the authoritative `Game`.
//!
//! `Game` owns the entity array, the per-player command queues, the
//! scheduler and the delta tracker. Each `update` runs the command and
//! schedule phase, then the physics and collision phase, then compacts.
//! Completely headless and deterministic for a given seed and input.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use starfield_core::commands::Command;
use starfield_core::constants::*;
use starfield_core::delta::{DeltaState, DeltaTracker};
use starfield_core::entity::{Bullet, Entity, EntityRegistry, Player, PowerupEffect};
use starfield_core::enums::{BoundaryRules, EntityKind, PlayerSubtype, ShotOrigin};
use starfield_core::events::EventHandler;
use starfield_core::state::DeltaSnapshot;
use starfield_core::vector::{self, Vec3};

use crate::scheduler::Scheduler;
use crate::systems;

/// Startup parameters for a game instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub tick_rate_hz: f64,
    /// Bots spawned by the level seeder.
    pub bot_count: u32,
    /// Lag the tick driver tolerates before resynchronising.
    pub max_latency_ms: f64,
    /// RNG seed for determinism. Same seed = same spawn layout.
    pub seed: u64,
    pub boundaries: BoundaryRules,
    pub shot_origin: ShotOrigin,
    pub asteroid_count: u32,
    pub powerup_count: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            tick_rate_hz: f64::from(TICK_RATE),
            bot_count: DEFAULT_BOT_COUNT,
            max_latency_ms: MAX_LATENCY_MS,
            seed: 42,
            boundaries: BoundaryRules::default(),
            shot_origin: ShotOrigin::Current,
            asteroid_count: DEFAULT_ASTEROID_COUNT,
            powerup_count: DEFAULT_POWERUP_COUNT,
        }
    }
}

impl GameConfig {
    /// Nominal tick length, rounded to whole milliseconds.
    pub fn tick_ms(&self) -> f64 {
        if self.tick_rate_hz > 0.0 {
            (1000.0 / self.tick_rate_hz).round()
        } else {
            TICK_MS
        }
    }
}

/// Why a spawn was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("name already in use: {0}")]
    NameInUse(String),
    #[error("entity id must not be empty")]
    EmptyId,
}

/// The authoritative simulation.
pub struct Game {
    config: GameConfig,
    pub(crate) entities: Vec<Entity>,
    pub(crate) entity_map: HashMap<String, usize>,
    pub(crate) time_stamp: f64,
    update_count: u64,
    command_queue: HashMap<String, VecDeque<Command>>,
    scheduler: Scheduler<Game>,
    pub(crate) delta: DeltaTracker,
    outgoing: DeltaState,
    pub(crate) registry: EntityRegistry,
    pub(crate) events: EventHandler,
    rng: ChaCha8Rng,
    next_entity_id: u64,
    autofire: HashSet<String>,
}

fn scheduler_of(game: &mut Game) -> &mut Scheduler<Game> {
    &mut game.scheduler
}

impl Game {
    /// Create an empty world with the given config.
    pub fn new(config: GameConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            entities: Vec::new(),
            entity_map: HashMap::new(),
            time_stamp: 0.0,
            update_count: 0,
            command_queue: HashMap::new(),
            scheduler: Scheduler::new(),
            delta: DeltaTracker::new(),
            outgoing: DeltaState::default(),
            registry: EntityRegistry::default(),
            events: EventHandler::new(),
            rng,
            next_entity_id: 0,
            autofire: HashSet::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Simulation clock in milliseconds.
    pub fn time_stamp(&self) -> f64 {
        self.time_stamp
    }

    /// Number of completed ticks.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Changes registered since the last completed tick.
    pub fn pending_delta(&self) -> &DeltaState {
        self.delta.state()
    }

    /// Delta produced by the last completed tick.
    pub fn last_delta(&self) -> &DeltaState {
        &self.outgoing
    }

    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn events_mut(&mut self) -> &mut EventHandler {
        &mut self.events
    }

    pub(crate) fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Drop everything tied to the current world: entities, pending input,
    /// scheduled tasks and unsent changes.
    pub(crate) fn clear_world(&mut self) {
        self.entities.clear();
        self.entity_map.clear();
        self.command_queue.clear();
        self.scheduler.clear();
        self.autofire.clear();
        self.delta.reset();
    }

    // --- Lookups ---

    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        systems::cleanup::lookup(&self.entities, &self.entity_map, id).map(|i| &self.entities[i])
    }

    pub fn get_player(&self, id: &str) -> Option<&Player> {
        self.get_entity(id).and_then(Entity::as_player)
    }

    pub fn entity_exists(&self, id: &str) -> bool {
        self.get_entity(id).is_some()
    }

    /// True only for `type == player` (humans and bots).
    pub fn player_exists(&self, id: &str) -> bool {
        self.get_player(id).is_some()
    }

    pub fn bot_count(&self) -> usize {
        self.entities
            .iter()
            .filter_map(Entity::as_player)
            .filter(|p| p.is_bot() && !p.base.remove)
            .count()
    }

    // --- Input ---

    /// Queue input for `id`; applied during the next tick's command phase.
    pub fn queue_command(&mut self, id: &str, commands: impl IntoIterator<Item = Command>) {
        self.command_queue
            .entry(id.to_owned())
            .or_default()
            .extend(commands);
    }

    /// Schedule a callback against this game, in simulation time.
    pub fn schedule<F>(&mut self, callback: F, ms: f64, repeat: bool)
    where
        F: FnMut(&mut Game, f64, f64) -> bool + Send + 'static,
    {
        self.scheduler.schedule(callback, ms, repeat);
    }

    // --- Ticking ---

    /// Advance to `time_stamp`. The delta is the difference to the current
    /// clock; a clock going backwards is treated as a zero-length tick.
    pub fn update(&mut self, time_stamp: f64) {
        let mut delta_ms = time_stamp - self.time_stamp;
        if delta_ms < 0.0 || !delta_ms.is_finite() {
            warn!(
                time_stamp,
                current = self.time_stamp,
                "non-monotonic timestamp, clamping delta to 0"
            );
            delta_ms = 0.0;
        } else {
            self.time_stamp = time_stamp;
        }

        // 1. Commands, then scheduled tasks.
        let started = systems::commands::run(&mut self.entities, &mut self.command_queue);
        for id in started {
            self.start_shooting(&id);
        }
        let now = self.time_stamp;
        Scheduler::run_pass(self, scheduler_of, now, delta_ms);

        // 2. Physics and collisions.
        let world = systems::physics::World {
            width: self.config.width,
            height: self.config.height,
            boundaries: &self.config.boundaries,
        };
        let effects = systems::physics::run(&mut self.entities, delta_ms, &world, &mut self.delta);
        for effect in effects {
            self.apply_effect(effect);
        }

        // 3. Compaction.
        systems::cleanup::run(&mut self.entities, &mut self.entity_map);

        self.outgoing = self.delta.take();
        self.update_count += 1;
    }

    /// Advance by one nominal tick and return the resulting delta.
    pub fn tick(&mut self) -> DeltaSnapshot {
        let next = self.time_stamp + self.config.tick_ms();
        self.update(next);
        self.delta_snapshot()
    }

    // --- Spawning ---

    /// Add a human player. Position is random within the world unless
    /// `data` supplies one.
    pub fn join(
        &mut self,
        id: &str,
        data: Option<&Map<String, Value>>,
    ) -> Result<&Entity, SpawnError> {
        self.check_id(id)?;
        let mut params = data.cloned().unwrap_or_default();
        params.insert("id".into(), json!(id));
        if !params.contains_key("pos") {
            let pos = self.random_position();
            params.insert("pos".into(), json!([pos.x, pos.y, 0.0]));
        }
        let player = Player::from_params(PlayerSubtype::Player, &params);
        info!(id, "player joined");
        self.insert_player(player)
    }

    /// Add a bot at a random position with a random drift.
    pub fn add_bot(&mut self, id: &str) -> Result<&Entity, SpawnError> {
        self.check_id(id)?;
        let mut bot = Player::new(id, PlayerSubtype::Bot);
        bot.base.pos = self.random_position();
        bot.base.last_pos = bot.base.pos;
        let rng = self.rng_mut();
        bot.base.velocity = Vec3::new(rng.gen_range(-0.2..=0.2), rng.gen_range(-0.2..=0.2), 0.0);
        info!(id, "bot added");
        self.insert_player(bot)
    }

    /// Destroy the player through the delta-registering path.
    pub fn leave(&mut self, id: &str) -> bool {
        self.command_queue.remove(id);
        let Some(index) = systems::cleanup::lookup(&self.entities, &self.entity_map, id) else {
            return false;
        };
        let entity = &mut self.entities[index];
        if entity.kind() != EntityKind::Player {
            return false;
        }
        let destroyed = entity.destroy(&mut self.delta);
        if destroyed {
            info!(id, "player left");
        }
        destroyed
    }

    /// Insert a fully built entity and register its full record.
    pub fn queue_entity(&mut self, entity: Entity) -> Result<usize, SpawnError> {
        self.check_id(entity.id())?;
        entity.register_full(&mut self.delta);
        Ok(self.insert(entity))
    }

    /// Fire one bullet from `player_id`. Returns the new bullet's id.
    pub fn shoot(&mut self, player_id: &str) -> Option<String> {
        let player = self.get_player(player_id).filter(|p| !p.base.remove)?;

        let origin = match self.config.shot_origin {
            ShotOrigin::Current => player.base.pos,
            ShotOrigin::Predicted => vector::add(
                player.base.pos,
                vector::scale(player.base.velocity, self.config.tick_ms()),
            ),
        };
        let muzzle = vector::scale(player.facing(), BULLET_MUZZLE_SPEED);
        let velocity = vector::add(player.base.velocity, muzzle);
        let (strength, range) = (player.bullet_strength, player.bullet_range);
        let angle = player.base.angle;

        let id = self.next_id("bullet");
        let mut bullet = Bullet::fired(id.clone(), player_id, origin, velocity);
        bullet.strength = strength;
        bullet.range = range;
        bullet.base.angle = angle;

        let entity = Entity::Bullet(bullet);
        entity.register_full(&mut self.delta);
        self.insert(entity);
        Some(id)
    }

    /// Fresh `prefix_n` id not used by any live entity.
    pub fn next_id(&mut self, prefix: &str) -> String {
        loop {
            let id = format!("{prefix}_{}", self.next_entity_id);
            self.next_entity_id += 1;
            if !self.entity_map.contains_key(&id) {
                return id;
            }
        }
    }

    pub(crate) fn random_position(&mut self) -> Vec3 {
        let (w, h) = (self.config.width, self.config.height);
        let rng = self.rng_mut();
        Vec3::new(rng.gen_range(0.0..w.max(1.0)), rng.gen_range(0.0..h.max(1.0)), 0.0)
    }

    fn check_id(&self, id: &str) -> Result<(), SpawnError> {
        if id.is_empty() {
            return Err(SpawnError::EmptyId);
        }
        if self.entity_map.contains_key(id) {
            return Err(SpawnError::NameInUse(id.to_owned()));
        }
        Ok(())
    }

    fn insert_player(&mut self, player: Player) -> Result<&Entity, SpawnError> {
        let entity = Entity::Player(player);
        entity.register_full(&mut self.delta);
        let index = self.insert(entity);
        Ok(&self.entities[index])
    }

    pub(crate) fn insert(&mut self, entity: Entity) -> usize {
        let index = self.entities.len();
        self.entity_map.insert(entity.id().to_owned(), index);
        self.entities.push(entity);
        index
    }

    /// Fire immediately, then keep firing every `shootRate` ms while the
    /// player holds the trigger. At most one auto-fire task per player.
    fn start_shooting(&mut self, id: &str) {
        self.shoot(id);
        let Some(rate) = self.get_player(id).map(|p| p.shoot_rate) else {
            return;
        };
        if !self.autofire.insert(id.to_owned()) {
            return;
        }

        let id = id.to_owned();
        self.schedule(
            move |game, _, _| {
                let firing = game.get_player(&id).is_some_and(|p| p.shooting && !p.base.remove);
                if firing {
                    game.shoot(&id);
                } else {
                    game.autofire.remove(&id);
                    debug!(id = %id, "auto-fire cancelled");
                }
                firing
            },
            rate,
            true,
        );
    }

    fn apply_effect(&mut self, effect: PowerupEffect) {
        match effect {
            PowerupEffect::ShieldBoost { player_id, duration_ms } => {
                debug!(player = %player_id, duration_ms, "shield boost scheduled to expire");
                self.schedule(
                    move |game, _, _| {
                        game.restore_shield_max(&player_id);
                        false
                    },
                    duration_ms,
                    false,
                );
            }
        }
    }

    fn restore_shield_max(&mut self, id: &str) {
        let Some(index) = systems::cleanup::lookup(&self.entities, &self.entity_map, id) else {
            return;
        };
        if let Entity::Player(p) = &mut self.entities[index] {
            if !p.base.remove {
                p.restore_shield_max(&mut self.delta);
            }
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("time_stamp", &self.time_stamp)
            .field("update_count", &self.update_count)
            .field("entities", &self.entities.len())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
