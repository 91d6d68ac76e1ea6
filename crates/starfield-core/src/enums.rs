//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Top-level entity type, as carried in the `type` field of a serialized entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Bullet,
    /// Free-floating obstacle (asteroids).
    Object,
    Powerup,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Bullet => "bullet",
            EntityKind::Object => "object",
            EntityKind::Powerup => "powerup",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "player" => Some(EntityKind::Player),
            "bullet" => Some(EntityKind::Bullet),
            "object" => Some(EntityKind::Object),
            "powerup" => Some(EntityKind::Powerup),
            _ => None,
        }
    }
}

/// Player variant: a human-controlled ship or a server-side bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSubtype {
    #[default]
    Player,
    Bot,
}

impl PlayerSubtype {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerSubtype::Player => "player",
            PlayerSubtype::Bot => "bot",
        }
    }
}

/// Powerup variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerupKind {
    /// Tops the shield up by `power`, capped at `shieldMax`.
    #[default]
    Shield,
    /// Temporarily raises `shieldMax` by `power`.
    ShieldUp,
}

impl PowerupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerupKind::Shield => "shield",
            PowerupKind::ShieldUp => "shieldup",
        }
    }
}

/// What happens to an entity that leaves the world rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Teleport to the opposite edge once fully outside.
    #[default]
    Wrap,
    /// Invert and damp the offending velocity component.
    Bounce,
    /// Destroy the entity.
    Despawn,
}

/// Boundary policy per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryRules {
    pub player: BoundaryPolicy,
    pub bullet: BoundaryPolicy,
    pub object: BoundaryPolicy,
    pub powerup: BoundaryPolicy,
}

impl Default for BoundaryRules {
    fn default() -> Self {
        Self {
            player: BoundaryPolicy::Wrap,
            bullet: BoundaryPolicy::Despawn,
            object: BoundaryPolicy::Wrap,
            powerup: BoundaryPolicy::Bounce,
        }
    }
}

impl BoundaryRules {
    pub fn for_kind(&self, kind: EntityKind) -> BoundaryPolicy {
        match kind {
            EntityKind::Player => self.player,
            EntityKind::Bullet => self.bullet,
            EntityKind::Object => self.object,
            EntityKind::Powerup => self.powerup,
        }
    }
}

/// Where a freshly fired bullet is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotOrigin {
    /// At the shooter's current position.
    #[default]
    Current,
    /// At the shooter's position one tick ahead.
    Predicted,
}
