//! Pairwise collision tests and type-specific resolution.

use serde_json::json;
use tracing::debug;

use starfield_core::constants::COLLISION_DAMAGE_PER_SPEED;
use starfield_core::delta::DeltaTracker;
use starfield_core::entity::{Entity, EntityBase, PowerupEffect};
use starfield_core::enums::EntityKind;
use starfield_core::events::COLLISION;
use starfield_core::vector::{self, Vec3};

/// How a candidate pair is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A bullet strikes a player or an asteroid.
    Hit,
    /// A player collects a powerup.
    Pickup,
    /// Two players collide: impulse plus damage.
    Ram,
    /// Impulse only.
    Bounce,
    /// Nothing happens (powerups only interact with players).
    Ignore,
}

/// Dispatch on the type pair. Order of the two entities does not matter.
pub fn classify(a: EntityKind, b: EntityKind) -> Resolution {
    use EntityKind::*;
    match (a, b) {
        (Player, Bullet) | (Bullet, Player) | (Object, Bullet) | (Bullet, Object) => {
            Resolution::Hit
        }
        (Player, Powerup) | (Powerup, Player) => Resolution::Pickup,
        (Powerup, _) | (_, Powerup) => Resolution::Ignore,
        (Player, Player) => Resolution::Ram,
        (Bullet, Bullet) => Resolution::Ignore,
        _ => Resolution::Bounce,
    }
}

/// Filters applied before any geometry: both live, both collidable,
/// neither owns the other, and not two bullets.
pub fn is_candidate(a: &Entity, b: &Entity) -> bool {
    let (ba, bb) = (a.base(), b.base());
    !ba.remove
        && !bb.remove
        && ba.collidable
        && bb.collidable
        && a.unrelated(b)
        && !(a.kind() == EntityKind::Bullet && b.kind() == EntityKind::Bullet)
}

/// Earliest time in `[0, delta_ms]` at which `mover` first touches
/// `target`, assuming both keep their current velocities.
pub fn predict_intersection(mover: &EntityBase, target: &EntityBase, delta_ms: f64) -> Option<f64> {
    let offset = vector::subtract(mover.pos, target.pos);
    let rel_velocity = vector::subtract(mover.velocity, target.velocity);
    let reach = mover.radius + target.radius;

    let c = vector::dot(offset, offset) - reach * reach;
    if c < 0.0 {
        return Some(0.0);
    }
    let a = vector::dot(rel_velocity, rel_velocity);
    if a <= f64::EPSILON {
        return None;
    }
    let b = 2.0 * vector::dot(offset, rel_velocity);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=delta_ms).contains(&t).then_some(t)
}

/// Resolve the 2-body elastic impulse along the contact normal.
/// Returns the closing speed along the normal before the impulse.
pub fn elastic_impulse(a: &mut EntityBase, b: &mut EntityBase, sink: &mut DeltaTracker) -> f64 {
    let (m1, m2) = (a.mass, b.mass);
    let total = m1 + m2;

    let mut normal = vector::normalize(vector::subtract(a.pos, b.pos));
    if normal == Vec3::ZERO {
        normal = vector::normalize(Vec3::new(1.0, 1.0, 0.0));
    }
    let tangent = vector::perpendicular(normal);

    let v1n = vector::dot(normal, a.velocity);
    let v1t = vector::dot(tangent, a.velocity);
    let v2n = vector::dot(normal, b.velocity);
    let v2t = vector::dot(tangent, b.velocity);

    let v1n_after = (v1n * (m1 - m2) + 2.0 * m2 * v2n) / total;
    let v2n_after = (v2n * (m2 - m1) + 2.0 * m1 * v1n) / total;

    a.velocity = vector::add(vector::scale(normal, v1n_after), vector::scale(tangent, v1t));
    b.velocity = vector::add(vector::scale(normal, v2n_after), vector::scale(tangent, v2t));

    a.register_field(sink, "velocity");
    b.register_field(sink, "velocity");
    a.register_event(sink, COLLISION, vec![json!(b.id)]);

    (v1n - v2n).abs()
}

/// Test and resolve one pair. Effects that outlive the tick are pushed
/// onto `effects`. Returns whether the pair collided.
pub fn resolve(
    a: &mut Entity,
    b: &mut Entity,
    delta_ms: f64,
    sink: &mut DeltaTracker,
    effects: &mut Vec<PowerupEffect>,
) -> bool {
    if !is_candidate(a, b) {
        return false;
    }
    let resolution = classify(a.kind(), b.kind());
    if resolution == Resolution::Ignore {
        return false;
    }

    match resolution {
        Resolution::Hit => {
            let (bullet, target) = if a.kind() == EntityKind::Bullet { (a, b) } else { (b, a) };
            let Some(t) = predict_intersection(bullet.base(), target.base(), delta_ms) else {
                return false;
            };
            resolve_hit(bullet, target, t, sink);
        }
        Resolution::Pickup => {
            if !a.intersects(b) {
                return false;
            }
            let (powerup, player) = if a.kind() == EntityKind::Powerup { (a, b) } else { (b, a) };
            if let (Entity::Powerup(powerup), Entity::Player(player)) = (powerup, player) {
                debug!(powerup = %powerup.base.id, player = %player.base.id, "powerup collected");
                effects.extend(powerup.activate(player, sink));
            }
        }
        Resolution::Ram => {
            if !a.intersects(b) || !a.base().will_intersect(b.base()) {
                return false;
            }
            let closing = elastic_impulse(a.base_mut(), b.base_mut(), sink);
            let damage = closing * COLLISION_DAMAGE_PER_SPEED;
            for side in [a, b] {
                if let Entity::Player(p) = side {
                    p.adjust_shield(-damage, sink);
                }
            }
            debug!(closing, damage, "players collided");
        }
        Resolution::Bounce => {
            if !a.intersects(b) || !a.base().will_intersect(b.base()) {
                return false;
            }
            elastic_impulse(a.base_mut(), b.base_mut(), sink);
            debug!(a = %a.id(), b = %b.id(), "bounce");
        }
        Resolution::Ignore => return false,
    }
    true
}

/// Land the bullet at first contact, damage the target, consume the bullet.
fn resolve_hit(bullet: &mut Entity, target: &mut Entity, contact_ms: f64, sink: &mut DeltaTracker) {
    let Entity::Bullet(shot) = bullet else {
        return;
    };
    if contact_ms > 0.0 {
        shot.base.last_pos = shot.base.pos;
        shot.base.pos = vector::add(shot.base.pos, vector::scale(shot.base.velocity, contact_ms));
        shot.base.register_field(sink, "pos");
    }

    let (bullet_id, owner_id, strength) = (shot.base.id.clone(), shot.owner.clone(), shot.strength);
    match target {
        Entity::Player(p) => p.handle_hit(&bullet_id, &owner_id, strength, sink),
        Entity::Asteroid(a) => a.handle_hit(&bullet_id, &owner_id, strength, sink),
        _ => return,
    }
    shot.base.destroy(sink);
    debug!(bullet = %bullet_id, target = %target.id(), strength, "hit");
}

/// Mutable references to two distinct slots, `i < j`.
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
