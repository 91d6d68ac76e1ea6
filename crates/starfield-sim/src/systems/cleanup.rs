//! Compaction: drop removed entities and rebuild the id index.

use std::collections::HashMap;

use tracing::error;

use starfield_core::entity::Entity;

/// Remove every entity flagged `remove` and rebuild `entity_map` from the
/// surviving order.
pub fn run(entities: &mut Vec<Entity>, entity_map: &mut HashMap<String, usize>) {
    entities.retain(|e| !e.is_removed());
    rebuild_map(entities, entity_map);
}

pub fn rebuild_map(entities: &[Entity], entity_map: &mut HashMap<String, usize>) {
    entity_map.clear();
    entity_map.extend(
        entities
            .iter()
            .enumerate()
            .map(|(index, e)| (e.id().to_owned(), index)),
    );
}

/// Resolve `id` through the index, checking that the slot still holds it.
pub fn lookup(entities: &[Entity], entity_map: &HashMap<String, usize>, id: &str) -> Option<usize> {
    let index = *entity_map.get(id)?;
    match entities.get(index) {
        Some(entity) if entity.id() == id => Some(index),
        _ => {
            error!(id, index, "stale entity map reference");
            None
        }
    }
}
