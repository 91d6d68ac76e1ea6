//! Collectible powerups.

use serde_json::{json, Map, Value};

use crate::constants::*;
use crate::delta::DeltaTracker;
use crate::enums::PowerupKind;
use crate::events::POWERUP;
use crate::vector::Vec3;

use super::fields::{assign, decode_f64, merge_fields, FieldAccess};
use super::{EntityBase, Player};

#[derive(Debug, Clone, PartialEq)]
pub struct Powerup {
    pub base: EntityBase,
    pub kind: PowerupKind,
    /// Shield points for `Shield`, max-shield increase for `ShieldUp`.
    pub power: f64,
}

/// Follow-up the simulation must schedule after an activation.
#[derive(Debug, Clone, PartialEq)]
pub enum PowerupEffect {
    /// Restore the player's base `shieldMax` after `duration_ms`.
    ShieldBoost { player_id: String, duration_ms: f64 },
}

const POWERUP_FIELDS: &[&str] = &[
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
    "power",
];

impl FieldAccess for Powerup {
    fn fields(&self) -> &'static [&'static str] {
        POWERUP_FIELDS
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "power" => Some(json!(self.power)),
            _ => self.base.field(name),
        }
    }

    fn set_field(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "power" | "increase" => assign(&mut self.power, value, decode_f64),
            _ => self.base.set_field(name, value),
        }
    }
}

impl Powerup {
    pub fn new(id: impl Into<String>, kind: PowerupKind, pos: Vec3) -> Self {
        let (radius, power) = match kind {
            PowerupKind::Shield => (SHIELD_POWERUP_RADIUS, SHIELD_POWERUP_POWER),
            PowerupKind::ShieldUp => (SHIELDUP_POWERUP_RADIUS, SHIELDUP_POWERUP_POWER),
        };
        Self {
            base: EntityBase {
                id: id.into(),
                pos,
                last_pos: pos,
                radius,
                ..EntityBase::default()
            },
            kind,
            power,
        }
    }

    pub fn from_params(kind: PowerupKind, params: &Map<String, Value>) -> Self {
        let mut powerup = Self::new(String::new(), kind, Vec3::ZERO);
        merge_fields(&mut powerup, params);
        // The ShieldUp record historically names its magnitude `increase`.
        if let Some(increase) = params.get("increase") {
            powerup.set_field("increase", increase);
        }
        if !params.contains_key("lastPos") {
            powerup.base.last_pos = powerup.base.pos;
        }
        powerup
    }

    /// Powerups normally sit still; a moving one reports its position.
    pub fn compute_state(&mut self, delta_ms: f64, sink: &mut DeltaTracker) {
        if self.base.velocity != Vec3::ZERO {
            self.base.integrate(delta_ms);
            self.base.register_field(sink, "pos");
        } else {
            self.base.last_pos = self.base.pos;
        }
    }

    /// Apply the effect to `player` and consume the powerup.
    /// Returns a follow-up effect when one has to be scheduled.
    pub fn activate(
        &mut self,
        player: &mut Player,
        sink: &mut DeltaTracker,
    ) -> Option<PowerupEffect> {
        if self.base.remove || player.base.remove {
            return None;
        }

        let effect = match self.kind {
            PowerupKind::Shield => {
                let topped = (player.shield + self.power).min(player.shield_max);
                player.set_shield(topped, sink);
                None
            }
            PowerupKind::ShieldUp => {
                player.boost_shield_max(self.power, sink);
                player.set_shield(player.shield_max, sink);
                Some(PowerupEffect::ShieldBoost {
                    player_id: player.base.id.clone(),
                    duration_ms: SHIELDUP_DURATION_MS,
                })
            }
        };

        self.base.register_event(
            sink,
            POWERUP,
            vec![json!(self.kind.as_str()), json!(player.base.id)],
        );
        self.base.destroy(sink);
        effect
    }
}
