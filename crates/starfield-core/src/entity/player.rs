//! Player ships (human or bot).

use serde_json::{json, Map, Value};

use crate::commands::Command;
use crate::constants::*;
use crate::delta::DeltaTracker;
use crate::enums::PlayerSubtype;
use crate::events::HIT;
use crate::vector::{self, Vec3};

use super::fields::{assign, decode_bool, decode_f64, merge_fields, FieldAccess};
use super::EntityBase;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub base: EntityBase,
    pub subtype: PlayerSubtype,
    pub health: f64,
    pub shield: f64,
    pub shield_max: f64,
    /// `shieldMax` without any temporary boost.
    pub base_shield_max: f64,
    /// Fraction of incoming bullet strength that reaches the shield.
    pub shield_quality: f64,
    pub shield_regen_per_tick: f64,
    pub shield_pause_remaining: f64,
    pub shooting: bool,
    pub shoot_rate: f64,
    pub bullet_strength: f64,
    pub bullet_range: f64,
    /// Velocity added per tick while `accelerating`.
    pub thrust: f64,
    pub accelerating: bool,
    /// Radians per millisecond of rotation input.
    pub turn_rate: f64,
    /// -1 turning left, 1 turning right, 0 steady.
    pub rotation: i8,
}

/// Side effects of a command the simulation has to act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// `shooting` went from false to true.
    pub started_shooting: bool,
}

const PLAYER_FIELDS: &[&str] = &[
    "id",
    "pos",
    "lastPos",
    "velocity",
    "acceleration",
    "angle",
    "angularVelocity",
    "radius",
    "mass",
    "collidable",
    "rebound",
    "remove",
    "deltaScope",
    "health",
    // Limits before the value they clamp.
    "shieldMax",
    "baseShieldMax",
    "shield",
    "shieldQuality",
    "shieldRegenPerTick",
    "shieldPauseRemaining",
    "shooting",
    "shootRate",
    "bulletStrength",
    "bulletRange",
    "thrust",
    "accelerating",
    "turnRate",
    "rotation",
];

impl Default for Player {
    fn default() -> Self {
        Self {
            base: EntityBase {
                radius: PLAYER_RADIUS,
                mass: PLAYER_MASS,
                acceleration: Vec3::new(PLAYER_DAMPING, PLAYER_DAMPING, 0.0),
                ..EntityBase::default()
            },
            subtype: PlayerSubtype::Player,
            health: PLAYER_HEALTH,
            shield: PLAYER_SHIELD_MAX,
            shield_max: PLAYER_SHIELD_MAX,
            base_shield_max: PLAYER_SHIELD_MAX,
            shield_quality: PLAYER_SHIELD_QUALITY,
            shield_regen_per_tick: PLAYER_SHIELD_REGEN_PER_TICK,
            shield_pause_remaining: 0.0,
            shooting: false,
            shoot_rate: PLAYER_SHOOT_RATE_MS,
            bullet_strength: PLAYER_BULLET_STRENGTH,
            bullet_range: PLAYER_BULLET_RANGE,
            thrust: PLAYER_THRUST,
            accelerating: false,
            turn_rate: PLAYER_TURN_RATE,
            rotation: 0,
        }
    }
}

impl FieldAccess for Player {
    fn fields(&self) -> &'static [&'static str] {
        PLAYER_FIELDS
    }

    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "health" => json!(self.health),
            "shield" => json!(self.shield),
            "shieldMax" => json!(self.shield_max),
            "baseShieldMax" => json!(self.base_shield_max),
            "shieldQuality" => json!(self.shield_quality),
            "shieldRegenPerTick" => json!(self.shield_regen_per_tick),
            "shieldPauseRemaining" => json!(self.shield_pause_remaining),
            "shooting" => json!(self.shooting),
            "shootRate" => json!(self.shoot_rate),
            "bulletStrength" => json!(self.bullet_strength),
            "bulletRange" => json!(self.bullet_range),
            "thrust" => json!(self.thrust),
            "accelerating" => json!(self.accelerating),
            "turnRate" => json!(self.turn_rate),
            "rotation" => json!(self.rotation),
            _ => return self.base.field(name),
        })
    }

    fn set_field(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "health" => assign(&mut self.health, value, decode_f64),
            "shieldMax" => {
                assign(&mut self.shield_max, value, |v| decode_f64(v).filter(|m| *m >= 0.0))
            }
            "baseShieldMax" => {
                assign(&mut self.base_shield_max, value, |v| decode_f64(v).filter(|m| *m >= 0.0))
            }
            "shield" => {
                let max = self.shield_max;
                assign(&mut self.shield, value, |v| decode_f64(v).map(|s| s.clamp(0.0, max)))
            }
            "shieldQuality" => assign(&mut self.shield_quality, value, decode_f64),
            "shieldRegenPerTick" => assign(&mut self.shield_regen_per_tick, value, decode_f64),
            "shieldPauseRemaining" => assign(&mut self.shield_pause_remaining, value, decode_f64),
            "shooting" => assign(&mut self.shooting, value, decode_bool),
            "shootRate" => {
                assign(&mut self.shoot_rate, value, |v| decode_f64(v).filter(|r| *r > 0.0))
            }
            "bulletStrength" => assign(&mut self.bullet_strength, value, decode_f64),
            "bulletRange" => assign(&mut self.bullet_range, value, decode_f64),
            "thrust" => assign(&mut self.thrust, value, decode_f64),
            "accelerating" => assign(&mut self.accelerating, value, decode_bool),
            "turnRate" => assign(&mut self.turn_rate, value, decode_f64),
            "rotation" => assign(&mut self.rotation, value, |v| {
                decode_f64(v).map(|r| if r > 0.0 { 1 } else if r < 0.0 { -1 } else { 0 })
            }),
            _ => self.base.set_field(name, value),
        }
    }
}

impl Player {
    pub fn new(id: impl Into<String>, subtype: PlayerSubtype) -> Self {
        let mut player = Self {
            subtype,
            ..Self::default()
        };
        player.base.id = id.into();
        player
    }

    /// Variant defaults overlaid with caller params.
    pub fn from_params(subtype: PlayerSubtype, params: &Map<String, Value>) -> Self {
        let mut player = Self {
            subtype,
            ..Self::default()
        };
        merge_fields(&mut player, params);
        if !params.contains_key("baseShieldMax") {
            player.base_shield_max = player.shield_max;
        }
        if !params.contains_key("lastPos") {
            player.base.last_pos = player.base.pos;
        }
        player
    }

    pub fn is_bot(&self) -> bool {
        self.subtype == PlayerSubtype::Bot
    }

    /// Apply one input sample. Missing fields leave state unchanged.
    pub fn handle_cmd(&mut self, cmd: &Command) -> CommandOutcome {
        let mut outcome = CommandOutcome::default();

        if let Some(space) = cmd.space {
            let was_shooting = self.shooting;
            self.shooting = space != 0;
            outcome.started_shooting = !was_shooting && self.shooting;
        }

        if cmd.left.is_some() || cmd.right.is_some() {
            self.rotation = if cmd.left == Some(1) {
                -1
            } else if cmd.right == Some(1) {
                1
            } else {
                0
            };
        }

        if let Some(up) = cmd.up {
            self.accelerating = up != 0;
        }

        outcome
    }

    pub fn facing(&self) -> Vec3 {
        vector::facing(self.base.angle)
    }

    pub fn compute_state(&mut self, delta_ms: f64, sink: &mut DeltaTracker) {
        let base = &mut self.base;
        base.last_pos = base.pos;
        base.angle += f64::from(self.rotation) * self.turn_rate * delta_ms;

        let thrust = if self.accelerating { self.thrust } else { 0.0 };
        base.velocity = base.velocity * base.acceleration + vector::facing(base.angle) * thrust;
        base.pos = vector::add(base.pos, vector::scale(base.velocity, delta_ms));

        if self.shield_pause_remaining > 0.0 {
            self.shield_pause_remaining = (self.shield_pause_remaining - delta_ms).max(0.0);
        } else if self.shield < self.shield_max {
            self.shield = (self.shield + self.shield_regen_per_tick).min(self.shield_max);
            self.base.register_value(sink, "shield", json!(self.shield));
        }

        self.base.register_field(sink, "pos");
        self.base.register_field(sink, "velocity");
        self.base.register_field(sink, "angle");
    }

    pub fn set_shield(&mut self, value: f64, sink: &mut DeltaTracker) {
        self.shield = value.clamp(0.0, self.shield_max);
        self.base.register_value(sink, "shield", json!(self.shield));
    }

    /// Damage drains the shield first and spills into health.
    pub fn adjust_shield(&mut self, amount: f64, sink: &mut DeltaTracker) {
        if amount < 0.0 {
            self.shield_pause_remaining = PLAYER_SHIELD_PAUSE_MS;
        }
        let next = self.shield + amount;
        if next < 0.0 {
            self.set_shield(0.0, sink);
            self.adjust_health(next, sink);
        } else {
            self.set_shield(next, sink);
        }
    }

    /// Health at or below zero destroys the player.
    pub fn set_health(&mut self, value: f64, sink: &mut DeltaTracker) {
        self.health = value;
        self.base.register_value(sink, "health", json!(self.health));
        if self.health <= 0.0 {
            self.base.destroy(sink);
        }
    }

    pub fn adjust_health(&mut self, amount: f64, sink: &mut DeltaTracker) {
        self.set_health(self.health + amount, sink);
    }

    /// Take a bullet hit.
    pub fn handle_hit(
        &mut self,
        bullet_id: &str,
        owner_id: &str,
        strength: f64,
        sink: &mut DeltaTracker,
    ) {
        let damage = strength * self.shield_quality;
        self.base.register_event(sink, HIT, vec![json!(bullet_id), json!(owner_id)]);
        self.adjust_shield(-damage, sink);
    }

    /// Raise `shieldMax` above its base value by `amount`.
    pub fn boost_shield_max(&mut self, amount: f64, sink: &mut DeltaTracker) {
        self.shield_max = self.base_shield_max + amount;
        self.base.register_value(sink, "shieldMax", json!(self.shield_max));
    }

    /// Drop any boost, clamping the shield to the restored maximum.
    pub fn restore_shield_max(&mut self, sink: &mut DeltaTracker) {
        self.shield_max = self.base_shield_max;
        self.base.register_value(sink, "shieldMax", json!(self.shield_max));
        if self.shield > self.shield_max {
            self.set_shield(self.shield_max, sink);
        }
    }
}
