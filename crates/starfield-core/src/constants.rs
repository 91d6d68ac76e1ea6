//! Simulation constants and tuning parameters.
//!
//! Units: distances in world pixels, time in milliseconds, velocities in
//! pixels per millisecond.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Nominal milliseconds per tick (rounded, 33ms at 30Hz).
pub const TICK_MS: f64 = 33.0;

// --- World ---

/// Default world width.
pub const WORLD_WIDTH: f64 = 2500.0;

/// Default world height.
pub const WORLD_HEIGHT: f64 = 2500.0;

/// Default lag tolerance for the tick driver.
pub const MAX_LATENCY_MS: f64 = 100.0;

/// Delta bucket every built-in entity reports into.
pub const ENTITY_SCOPE: &str = "entities";

// --- Base entity defaults ---

pub const BASE_RADIUS: f64 = 1.0;
pub const BASE_MASS: f64 = 1.0;

/// Velocity damping factor applied by bounce boundaries.
pub const BASE_REBOUND: f64 = 0.96;

// --- Player ---

pub const PLAYER_RADIUS: f64 = 18.0;
pub const PLAYER_MASS: f64 = 1.0;
pub const PLAYER_HEALTH: f64 = 100.0;
pub const PLAYER_SHIELD_MAX: f64 = 100.0;
pub const PLAYER_SHIELD_QUALITY: f64 = 0.8;

/// Shield points regenerated per tick.
pub const PLAYER_SHIELD_REGEN_PER_TICK: f64 = 0.35;

/// Regeneration pause after the shield takes damage.
pub const PLAYER_SHIELD_PAUSE_MS: f64 = 1000.0;

/// Per-tick velocity damping (component-wise multiplier).
pub const PLAYER_DAMPING: f64 = 0.99;

/// Velocity added per tick while thrusting.
pub const PLAYER_THRUST: f64 = 0.02;

/// Radians turned per millisecond of rotation input.
pub const PLAYER_TURN_RATE: f64 = 0.004;

/// Milliseconds between auto-fire shots.
pub const PLAYER_SHOOT_RATE_MS: f64 = 150.0;

pub const PLAYER_BULLET_STRENGTH: f64 = 5.0;
pub const PLAYER_BULLET_RANGE: f64 = 800.0;

// --- Bullet ---

pub const BULLET_RADIUS: f64 = 2.0;
pub const BULLET_MASS: f64 = 0.05;
pub const BULLET_STRENGTH: f64 = 5.0;
pub const BULLET_RANGE: f64 = 800.0;
pub const BULLET_LIFESPAN_MS: f64 = 2000.0;

/// Muzzle speed added to the shooter's velocity along its facing.
pub const BULLET_MUZZLE_SPEED: f64 = 0.6;

// --- Asteroid ---

pub const ASTEROID_RADIUS: f64 = 18.0;

/// Health per unit of radius when health is not given explicitly.
pub const ASTEROID_HEALTH_PER_RADIUS: f64 = 10.0;

/// Mass per unit of radius when mass is not given explicitly.
pub const ASTEROID_MASS_PER_RADIUS: f64 = 0.1;

/// Default spin in radians per millisecond.
pub const ASTEROID_ANGULAR_VELOCITY: f64 = 0.002;

// --- Powerups ---

pub const SHIELD_POWERUP_POWER: f64 = 30.0;
pub const SHIELD_POWERUP_RADIUS: f64 = 5.0;
pub const SHIELDUP_POWERUP_POWER: f64 = 30.0;
pub const SHIELDUP_POWERUP_RADIUS: f64 = 7.0;

/// How long a ShieldUp max-shield raise lasts.
pub const SHIELDUP_DURATION_MS: f64 = 15_000.0;

// --- Collision ---

/// Slack subtracted from the combined radii in intersection tests.
pub const COLLISION_EPSILON: f64 = 1e-6;

/// Shield/health damage per unit of closing speed in a player ram.
pub const COLLISION_DAMAGE_PER_SPEED: f64 = 10.0;

// --- Seeding ---

pub const DEFAULT_BOT_COUNT: u32 = 6;
pub const BOT_SPAWN_INTERVAL_MS: f64 = 1000.0;
pub const DEFAULT_ASTEROID_COUNT: u32 = 8;
pub const DEFAULT_POWERUP_COUNT: u32 = 4;
