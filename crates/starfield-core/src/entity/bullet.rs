//! Projectiles fired by players.

use serde_json::{json, Map, Value};

use crate::constants::*;
use crate::delta::DeltaTracker;
use crate::vector::{self, Vec3};

use super::fields::{
    assign, decode_f64, decode_string, decode_vec3, merge_fields, vec3_value, FieldAccess,
};
use super::EntityBase;

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub base: EntityBase,
    /// Id of the firing player.
    pub owner: String,
    pub strength: f64,
    /// Maximum travel distance from `initial_pos`.
    pub range: f64,
    /// Remaining lifetime in milliseconds.
    pub lifespan: f64,
    pub initial_pos: Vec3,
}

const BULLET_FIELDS: &[&str] = &[
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
    "owner",
    "strength",
    "range",
    "lifespan",
    "initialPos",
];

impl Default for Bullet {
    fn default() -> Self {
        Self {
            base: EntityBase {
                radius: BULLET_RADIUS,
                mass: BULLET_MASS,
                ..EntityBase::default()
            },
            owner: String::new(),
            strength: BULLET_STRENGTH,
            range: BULLET_RANGE,
            lifespan: BULLET_LIFESPAN_MS,
            initial_pos: Vec3::ZERO,
        }
    }
}

impl FieldAccess for Bullet {
    fn fields(&self) -> &'static [&'static str] {
        BULLET_FIELDS
    }

    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "owner" => json!(self.owner),
            "strength" => json!(self.strength),
            "range" => json!(self.range),
            "lifespan" => json!(self.lifespan),
            "initialPos" => vec3_value(self.initial_pos),
            _ => return self.base.field(name),
        })
    }

    fn set_field(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "owner" => assign(&mut self.owner, value, decode_string),
            "strength" => assign(&mut self.strength, value, decode_f64),
            "range" => assign(&mut self.range, value, decode_f64),
            "lifespan" => assign(&mut self.lifespan, value, decode_f64),
            "initialPos" => assign(&mut self.initial_pos, value, decode_vec3),
            _ => self.base.set_field(name, value),
        }
    }
}

impl Bullet {
    /// A bullet leaving `pos` with the given velocity.
    pub fn fired(
        id: impl Into<String>,
        owner: impl Into<String>,
        pos: Vec3,
        velocity: Vec3,
    ) -> Self {
        let mut bullet = Self {
            owner: owner.into(),
            initial_pos: pos,
            ..Self::default()
        };
        bullet.base.id = id.into();
        bullet.base.pos = pos;
        bullet.base.last_pos = pos;
        bullet.base.velocity = velocity;
        bullet
    }

    pub fn from_params(params: &Map<String, Value>) -> Self {
        let mut bullet = Self::default();
        merge_fields(&mut bullet, params);
        if !params.contains_key("initialPos") {
            bullet.initial_pos = bullet.base.pos;
        }
        if !params.contains_key("lastPos") {
            bullet.base.last_pos = bullet.base.pos;
        }
        bullet
    }

    pub fn travelled(&self) -> f64 {
        vector::distance(self.base.pos, self.initial_pos)
    }

    /// Moves without registering; replicas integrate bullets themselves.
    /// Expires by lifespan or range.
    pub fn compute_state(&mut self, delta_ms: f64, sink: &mut DeltaTracker) {
        self.base.integrate(delta_ms);
        self.lifespan -= delta_ms;
        if self.lifespan <= 0.0 || self.travelled() > self.range {
            self.base.destroy(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_expires_by_lifespan() {
        let mut sink = DeltaTracker::new();
        let mut b = Bullet::fired("b", "p", Vec3::ZERO, Vec3::ZERO);
        b.lifespan = 50.0;
        b.compute_state(33.0, &mut sink);
        assert!(!b.base.remove);
        b.compute_state(33.0, &mut sink);
        assert!(b.base.remove);
    }

    #[test]
    fn test_bullet_expires_by_range() {
        let mut sink = DeltaTracker::new();
        let mut b = Bullet::fired("b", "p", Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        b.range = 50.0;
        b.compute_state(40.0, &mut sink);
        assert!(!b.base.remove);
        b.compute_state(40.0, &mut sink);
        assert!(b.base.remove);
        assert_eq!(sink.state().events.len(), 1);
    }
}
