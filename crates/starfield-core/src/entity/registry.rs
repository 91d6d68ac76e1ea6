//! `(type, subtype)` keyed factory used by load and delta-apply.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::enums::{EntityKind, PlayerSubtype, PowerupKind};

use super::{Asteroid, Bullet, Entity, Player, Powerup};

/// Builds an entity from a (possibly partial) record.
pub type Constructor = fn(&Map<String, Value>) -> Entity;

#[derive(Debug, Clone)]
pub struct EntityRegistry {
    constructors: HashMap<(String, String), Constructor>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("player", "player", |p| {
            Entity::Player(Player::from_params(PlayerSubtype::Player, p))
        });
        registry.register("player", "bot", |p| {
            Entity::Player(Player::from_params(PlayerSubtype::Bot, p))
        });
        registry.register("bullet", "bullet", |p| Entity::Bullet(Bullet::from_params(p)));
        registry.register("object", "asteroid", |p| {
            Entity::Asteroid(Asteroid::from_params(p))
        });
        registry.register("powerup", "shield", |p| {
            Entity::Powerup(Powerup::from_params(PowerupKind::Shield, p))
        });
        registry.register("powerup", "shieldup", |p| {
            Entity::Powerup(Powerup::from_params(PowerupKind::ShieldUp, p))
        });
        registry
    }
}

impl EntityRegistry {
    /// Registry with no constructors.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: &str, subtype: &str, constructor: Constructor) {
        self.constructors
            .insert((kind.to_owned(), subtype.to_owned()), constructor);
    }

    /// Build an entity from a record carrying `type` and `subtype`.
    /// A missing subtype falls back to the type name. Unknown pairs and
    /// records without an id yield `None`.
    pub fn instantiate(&self, record: &Map<String, Value>) -> Option<Entity> {
        let kind = EntityKind::parse(record.get("type")?.as_str()?)?.as_str();
        let subtype = match record.get("subtype") {
            Some(value) => value.as_str()?,
            None => kind,
        };
        let constructor = self
            .constructors
            .get(&(kind.to_owned(), subtype.to_owned()))?;
        let entity = constructor(record);
        if entity.id().is_empty() {
            return None;
        }
        Some(entity)
    }
}
