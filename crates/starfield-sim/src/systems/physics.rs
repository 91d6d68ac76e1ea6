//! Physics & collision pass.
//!
//! For each live entity in array order: collide against every later live
//! entity, then advance it, then apply its boundary policy. Resolution
//! order follows the current array order.

use starfield_core::delta::DeltaTracker;
use starfield_core::entity::{Entity, PowerupEffect};
use starfield_core::enums::BoundaryRules;

use super::{boundary, collision};

pub struct World<'a> {
    pub width: f64,
    pub height: f64,
    pub boundaries: &'a BoundaryRules,
}

/// Run the pass. Returns effects that must be scheduled by the caller.
pub fn run(
    entities: &mut [Entity],
    delta_ms: f64,
    world: &World<'_>,
    sink: &mut DeltaTracker,
) -> Vec<PowerupEffect> {
    let mut effects = Vec::new();
    let count = entities.len();

    for i in 0..count {
        if entities[i].is_removed() {
            continue;
        }

        for j in (i + 1)..count {
            if entities[i].is_removed() {
                break;
            }
            if entities[j].is_removed() {
                continue;
            }
            let (a, b) = collision::pair_mut(entities, i, j);
            collision::resolve(a, b, delta_ms, sink, &mut effects);
        }

        let entity = &mut entities[i];
        if entity.is_removed() {
            continue;
        }
        entity.compute_state(delta_ms, sink);
        if entity.is_removed() {
            continue;
        }
        let policy = world.boundaries.for_kind(entity.kind());
        boundary::apply(entity, policy, world.width, world.height, sink);
    }

    effects
}
