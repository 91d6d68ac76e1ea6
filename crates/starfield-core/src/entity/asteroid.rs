//! Drifting, spinning obstacles (`type: "object"`).

use serde_json::{json, Map, Value};

use crate::constants::*;
use crate::delta::DeltaTracker;
use crate::events::HIT;

use super::fields::{assign, decode_f64, merge_fields, FieldAccess};
use super::EntityBase;

#[derive(Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub base: EntityBase,
    pub health: f64,
}

const ASTEROID_FIELDS: &[&str] = &[
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
];

impl Default for Asteroid {
    fn default() -> Self {
        Self {
            base: EntityBase {
                radius: ASTEROID_RADIUS,
                mass: ASTEROID_RADIUS * ASTEROID_MASS_PER_RADIUS,
                angular_velocity: ASTEROID_ANGULAR_VELOCITY,
                ..EntityBase::default()
            },
            health: ASTEROID_RADIUS * ASTEROID_HEALTH_PER_RADIUS,
        }
    }
}

impl FieldAccess for Asteroid {
    fn fields(&self) -> &'static [&'static str] {
        ASTEROID_FIELDS
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "health" => Some(json!(self.health)),
            _ => self.base.field(name),
        }
    }

    fn set_field(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "health" => assign(&mut self.health, value, decode_f64),
            _ => self.base.set_field(name, value),
        }
    }
}

impl Asteroid {
    /// Health and mass scale with radius unless given explicitly.
    pub fn from_params(params: &Map<String, Value>) -> Self {
        let mut asteroid = Self::default();
        merge_fields(&mut asteroid, params);
        let radius = asteroid.base.radius;
        if !params.contains_key("health") {
            asteroid.health = radius * ASTEROID_HEALTH_PER_RADIUS;
        }
        if !params.contains_key("mass") {
            asteroid.base.mass = radius * ASTEROID_MASS_PER_RADIUS;
        }
        if !params.contains_key("lastPos") {
            asteroid.base.last_pos = asteroid.base.pos;
        }
        asteroid
    }

    pub fn compute_state(&mut self, delta_ms: f64, sink: &mut DeltaTracker) {
        self.base.integrate(delta_ms);
        self.base.angle += self.base.angular_velocity * delta_ms;
        self.base.register_field(sink, "angle");
        self.base.register_field(sink, "pos");
    }

    pub fn handle_hit(
        &mut self,
        bullet_id: &str,
        owner_id: &str,
        strength: f64,
        sink: &mut DeltaTracker,
    ) {
        self.base.register_event(sink, HIT, vec![json!(bullet_id), json!(owner_id)]);
        self.health -= strength;
        self.base.register_value(sink, "health", json!(self.health));
        if self.health <= 0.0 {
            self.base.destroy(sink);
        }
    }
}
