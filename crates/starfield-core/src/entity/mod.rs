//! Entity model: the shared base record and the four concrete variants.
//!
//! Every mutation that replicas must see is written to a [`DeltaTracker`]
//! passed in by the caller. There is no hidden back-reference to a tracker.

pub mod asteroid;
pub mod bullet;
pub mod fields;
pub mod player;
pub mod powerup;
pub mod registry;

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::constants::*;
use crate::delta::DeltaTracker;
use crate::enums::EntityKind;
use crate::events::{GameEvent, DESTROY};
use crate::vector::{self, Vec3};

pub use asteroid::Asteroid;
pub use bullet::Bullet;
pub use fields::FieldAccess;
pub use player::{CommandOutcome, Player};
pub use powerup::{Powerup, PowerupEffect};
pub use registry::EntityRegistry;

use fields::{assign, decode_bool, decode_f64, decode_string, decode_vec3, vec3_value};

/// Fields common to every entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBase {
    pub id: String,
    pub pos: Vec3,
    pub last_pos: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Heading in radians.
    pub angle: f64,
    /// Spin in radians per millisecond.
    pub angular_velocity: f64,
    pub radius: f64,
    pub mass: f64,
    pub collidable: bool,
    /// Velocity multiplier applied on a bounce boundary.
    pub rebound: f64,
    /// Marked for removal at the end of the current tick.
    pub remove: bool,
    /// Delta bucket this entity reports into.
    pub delta_scope: String,
}

impl Default for EntityBase {
    fn default() -> Self {
        Self {
            id: String::new(),
            pos: Vec3::ZERO,
            last_pos: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            radius: BASE_RADIUS,
            mass: BASE_MASS,
            collidable: true,
            rebound: BASE_REBOUND,
            remove: false,
            delta_scope: ENTITY_SCOPE.to_owned(),
        }
    }
}

pub(crate) const BASE_FIELDS: &[&str] = &[
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
];

impl FieldAccess for EntityBase {
    fn fields(&self) -> &'static [&'static str] {
        BASE_FIELDS
    }

    fn field(&self, name: &str) -> Option<Value> {
        Some(match name {
            "id" => json!(self.id),
            "pos" => vec3_value(self.pos),
            "lastPos" => vec3_value(self.last_pos),
            "velocity" => vec3_value(self.velocity),
            "acceleration" => vec3_value(self.acceleration),
            "angle" => json!(self.angle),
            "angularVelocity" => json!(self.angular_velocity),
            "radius" => json!(self.radius),
            "mass" => json!(self.mass),
            "collidable" => json!(self.collidable),
            "rebound" => json!(self.rebound),
            "remove" => json!(self.remove),
            "deltaScope" => json!(self.delta_scope),
            _ => return None,
        })
    }

    fn set_field(&mut self, name: &str, value: &Value) -> bool {
        match name {
            // Identity is fixed once assigned.
            "id" => self.id.is_empty() && assign(&mut self.id, value, decode_string),
            "pos" => assign(&mut self.pos, value, decode_vec3),
            "lastPos" => assign(&mut self.last_pos, value, decode_vec3),
            "velocity" => assign(&mut self.velocity, value, decode_vec3),
            "acceleration" => assign(&mut self.acceleration, value, decode_vec3),
            "angle" => assign(&mut self.angle, value, decode_f64),
            "angularVelocity" => assign(&mut self.angular_velocity, value, decode_f64),
            "radius" => assign(&mut self.radius, value, |v| decode_f64(v).filter(|r| *r > 0.0)),
            "mass" => assign(&mut self.mass, value, |v| decode_f64(v).filter(|m| *m > 0.0)),
            "collidable" => assign(&mut self.collidable, value, decode_bool),
            "rebound" => assign(&mut self.rebound, value, decode_f64),
            "remove" => assign(&mut self.remove, value, decode_bool),
            "deltaScope" => assign(&mut self.delta_scope, value, |v| {
                decode_string(v).filter(|s| !s.is_empty() && s != "events")
            }),
            _ => false,
        }
    }
}

impl EntityBase {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn distance_to(&self, other: &EntityBase) -> f64 {
        vector::distance(self.pos, other.pos)
    }

    /// Center distance below the combined radii, with a small slack so that
    /// touching circles do not flap between states.
    pub fn intersects(&self, other: &EntityBase) -> bool {
        self.distance_to(other) + COLLISION_EPSILON < self.radius + other.radius
    }

    /// True while the two entities are closing on each other.
    pub fn will_intersect(&self, other: &EntityBase) -> bool {
        let relative_velocity = vector::subtract(self.velocity, other.velocity);
        let offset = vector::subtract(other.pos, self.pos);
        vector::dot(relative_velocity, offset) > 0.0
    }

    /// Per-axis sign of a boundary violation, or `None` while fully inside
    /// `[radius, size - radius]` on both axes.
    pub fn outside_world(&self, width: f64, height: f64) -> Option<(i8, i8)> {
        let axis = |p: f64, size: f64| -> i8 {
            if p < self.radius {
                -1
            } else if p > size - self.radius {
                1
            } else {
                0
            }
        };
        let sx = axis(self.pos.x, width);
        let sy = axis(self.pos.y, height);
        if sx == 0 && sy == 0 {
            None
        } else {
            Some((sx, sy))
        }
    }

    /// Default kinematics: remember the last position, then integrate.
    pub fn integrate(&mut self, delta_ms: f64) {
        self.last_pos = self.pos;
        self.pos = vector::add(self.pos, vector::scale(self.velocity, delta_ms));
    }

    pub fn register_value(&self, sink: &mut DeltaTracker, field: &str, value: Value) {
        sink.register_change(&self.delta_scope, &self.id, field, value);
    }

    /// Register the current value of a base field.
    pub fn register_field(&self, sink: &mut DeltaTracker, field: &str) {
        if let Some(value) = self.field(field) {
            self.register_value(sink, field, value);
        }
    }

    pub fn register_event(&self, sink: &mut DeltaTracker, name: &str, args: Vec<Value>) {
        sink.register_event(GameEvent::new(name, self.id.clone(), args));
    }

    /// Mark for removal and announce it. Returns false if already removed.
    pub fn destroy(&mut self, sink: &mut DeltaTracker) -> bool {
        if self.remove {
            return false;
        }
        self.remove = true;
        self.register_value(sink, "remove", Value::Bool(true));
        self.register_event(sink, DESTROY, Vec::new());
        true
    }
}

/// Any simulated object.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Player(Player),
    Bullet(Bullet),
    Asteroid(Asteroid),
    Powerup(Powerup),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Player(_) => EntityKind::Player,
            Entity::Bullet(_) => EntityKind::Bullet,
            Entity::Asteroid(_) => EntityKind::Object,
            Entity::Powerup(_) => EntityKind::Powerup,
        }
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            Entity::Player(p) => p.subtype.as_str(),
            Entity::Bullet(_) => "bullet",
            Entity::Asteroid(_) => "asteroid",
            Entity::Powerup(p) => p.kind.as_str(),
        }
    }

    pub fn base(&self) -> &EntityBase {
        match self {
            Entity::Player(e) => &e.base,
            Entity::Bullet(e) => &e.base,
            Entity::Asteroid(e) => &e.base,
            Entity::Powerup(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut EntityBase {
        match self {
            Entity::Player(e) => &mut e.base,
            Entity::Bullet(e) => &mut e.base,
            Entity::Asteroid(e) => &mut e.base,
            Entity::Powerup(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn is_removed(&self) -> bool {
        self.base().remove
    }

    /// Id of the entity that spawned this one (bullets only).
    pub fn owner(&self) -> Option<&str> {
        match self {
            Entity::Bullet(b) => Some(b.owner.as_str()),
            _ => None,
        }
    }

    /// Neither entity owns the other.
    pub fn unrelated(&self, other: &Entity) -> bool {
        self.owner() != Some(other.id()) && other.owner() != Some(self.id())
    }

    pub fn intersects(&self, other: &Entity) -> bool {
        self.base().intersects(other.base())
    }

    pub fn outside_world(&self, width: f64, height: f64) -> Option<(i8, i8)> {
        self.base().outside_world(width, height)
    }

    /// Advance one tick, registering whatever this variant replicates.
    pub fn compute_state(&mut self, delta_ms: f64, sink: &mut DeltaTracker) {
        match self {
            Entity::Player(p) => p.compute_state(delta_ms, sink),
            Entity::Bullet(b) => b.compute_state(delta_ms, sink),
            Entity::Asteroid(a) => a.compute_state(delta_ms, sink),
            Entity::Powerup(p) => p.compute_state(delta_ms, sink),
        }
    }

    pub fn destroy(&mut self, sink: &mut DeltaTracker) -> bool {
        self.base_mut().destroy(sink)
    }

    /// Full record including `type` and `subtype`.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut out = fields::fields_to_map(self);
        out.insert("type".into(), json!(self.kind().as_str()));
        out.insert("subtype".into(), json!(self.subtype()));
        out
    }

    /// Apply the fields present in a partial record.
    pub fn merge_delta(&mut self, partial: &Map<String, Value>) -> Vec<&'static str> {
        fields::merge_fields(self, partial)
    }

    /// Register the full record, replacing any pending field changes.
    pub fn register_full(&self, sink: &mut DeltaTracker) {
        let base = self.base();
        sink.register_object(&base.delta_scope, &base.id, self.to_json());
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_bullet(&self) -> Option<&Bullet> {
        match self {
            Entity::Bullet(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_asteroid(&self) -> Option<&Asteroid> {
        match self {
            Entity::Asteroid(a) => Some(a),
            _ => None,
        }
    }

}

impl FieldAccess for Entity {
    fn fields(&self) -> &'static [&'static str] {
        match self {
            Entity::Player(e) => e.fields(),
            Entity::Bullet(e) => e.fields(),
            Entity::Asteroid(e) => e.fields(),
            Entity::Powerup(e) => e.fields(),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match self {
            Entity::Player(e) => e.field(name),
            Entity::Bullet(e) => e.field(name),
            Entity::Asteroid(e) => e.field(name),
            Entity::Powerup(e) => e.field(name),
        }
    }

    fn set_field(&mut self, name: &str, value: &Value) -> bool {
        match self {
            Entity::Player(e) => e.set_field(name, value),
            Entity::Bullet(e) => e.set_field(name, value),
            Entity::Asteroid(e) => e.set_field(name, value),
            Entity::Powerup(e) => e.set_field(name, value),
        }
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
