//! World-boundary policies: wrap, bounce, despawn.

use starfield_core::delta::DeltaTracker;
use starfield_core::entity::Entity;
use starfield_core::enums::BoundaryPolicy;

/// Apply `policy` if the entity violates the world rectangle.
pub fn apply(
    entity: &mut Entity,
    policy: BoundaryPolicy,
    width: f64,
    height: f64,
    sink: &mut DeltaTracker,
) {
    let Some((sx, sy)) = entity.outside_world(width, height) else {
        return;
    };

    match policy {
        BoundaryPolicy::Wrap => wrap(entity, width, height, sink),
        BoundaryPolicy::Bounce => bounce(entity, sx, sy, sink),
        BoundaryPolicy::Despawn => {
            entity.destroy(sink);
        }
    }
}

/// Shift to the opposite edge once the entity is fully outside an axis.
fn wrap(entity: &mut Entity, width: f64, height: f64, sink: &mut DeltaTracker) {
    let base = entity.base_mut();
    let r = base.radius;
    let shift = |p: f64, size: f64| -> f64 {
        if p < -r {
            size + 2.0 * r
        } else if p > size + r {
            -(size + 2.0 * r)
        } else {
            0.0
        }
    };
    let dx = shift(base.pos.x, width);
    let dy = shift(base.pos.y, height);
    if dx == 0.0 && dy == 0.0 {
        return;
    }

    base.pos.x += dx;
    base.pos.y += dy;
    base.last_pos.x += dx;
    base.last_pos.y += dy;
    base.register_field(sink, "pos");
    base.register_field(sink, "lastPos");
}

/// Reflect velocity components still heading out of bounds.
fn bounce(entity: &mut Entity, sx: i8, sy: i8, sink: &mut DeltaTracker) {
    let base = entity.base_mut();
    let mut changed = false;
    if (sx < 0 && base.velocity.x < 0.0) || (sx > 0 && base.velocity.x > 0.0) {
        base.velocity.x = -base.velocity.x * base.rebound;
        changed = true;
    }
    if (sy < 0 && base.velocity.y < 0.0) || (sy > 0 && base.velocity.y > 0.0) {
        base.velocity.y = -base.velocity.y * base.rebound;
        changed = true;
    }
    if changed {
        base.register_field(sink, "velocity");
    }
}
