//! Full-state save/load and incremental delta application.
//!
//! `save`/`load` move whole worlds (join, on request, level seeding).
//! `apply_delta` keeps a replica in step with the authority tick by tick.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use starfield_core::delta::DeltaState;
use starfield_core::state::{DeltaSnapshot, FullSnapshot, SavedState};

use crate::engine::Game;
use crate::systems;

impl Game {
    /// Deep snapshot of every live entity plus the clock.
    pub fn save(&self) -> SavedState {
        let mut state = SavedState {
            time_stamp: self.time_stamp,
            ..SavedState::default()
        };
        for entity in self.entities.iter().filter(|e| !e.is_removed()) {
            state
                .entity_map
                .insert(entity.id().to_owned(), state.entities.len());
            state.entities.push(entity.to_json());
        }
        state
    }

    /// Replace the world with `state`. Records of unknown type/subtype and
    /// duplicate ids are skipped.
    pub fn load(&mut self, state: &SavedState) {
        self.clear_world();
        self.time_stamp = state.time_stamp;

        for record in &state.entities {
            let Some(entity) = self.registry.instantiate(record) else {
                warn!(
                    kind = ?record.get("type"),
                    subtype = ?record.get("subtype"),
                    "skipping unknown entity kind on load"
                );
                continue;
            };
            if self.entity_map.contains_key(entity.id()) {
                warn!(id = %entity.id(), "skipping duplicate entity id on load");
                continue;
            }
            self.insert(entity);
        }
    }

    /// Apply one tick of changes from the authority, then fire its events
    /// in order through the bound handlers.
    pub fn apply_delta(&mut self, delta: &DeltaState) {
        let mut purged = false;

        for (scope, entries) in &delta.scopes {
            for (id, fields) in entries {
                let removed = fields.get("remove").is_some_and(|v| v == &Value::Bool(true));
                match systems::cleanup::lookup(&self.entities, &self.entity_map, id) {
                    Some(index) if removed => {
                        self.entities[index].base_mut().remove = true;
                        purged = true;
                    }
                    Some(index) => {
                        self.entities[index].merge_delta(fields);
                    }
                    None if removed => {}
                    None => self.spawn_from_delta(scope, id, fields),
                }
            }
        }

        if purged {
            systems::cleanup::run(&mut self.entities, &mut self.entity_map);
        }

        for event in &delta.events {
            self.events.fire(event);
        }
    }

    fn spawn_from_delta(&mut self, scope: &str, id: &str, fields: &serde_json::Map<String, Value>) {
        let mut record = fields.clone();
        record
            .entry("id")
            .or_insert_with(|| Value::String(id.to_owned()));
        record
            .entry("deltaScope")
            .or_insert_with(|| Value::String(scope.to_owned()));
        match self.registry.instantiate(&record) {
            Some(entity) if entity.id() == id => {
                self.insert(entity);
            }
            _ => warn!(id, scope, "skipping unknown entity kind in delta"),
        }
    }

    /// `save()` wrapped with the simulation timestamp.
    pub fn full_snapshot(&self) -> FullSnapshot {
        FullSnapshot {
            time_stamp: self.time_stamp,
            state: self.save(),
        }
    }

    /// The last completed tick's delta wrapped with the simulation timestamp.
    pub fn delta_snapshot(&self) -> DeltaSnapshot {
        DeltaSnapshot {
            time_stamp: self.time_stamp,
            state: self.last_delta().clone(),
        }
    }

    /// Apply a received delta snapshot and adopt its timestamp.
    pub fn apply_delta_snapshot(&mut self, snapshot: &DeltaSnapshot) {
        self.apply_delta(&snapshot.state);
        if snapshot.time_stamp > self.time_stamp {
            self.time_stamp = snapshot.time_stamp;
        }
    }

    /// Ids by array index, mirroring the wire `entityMap`.
    pub fn entity_index(&self) -> BTreeMap<String, usize> {
        self.entity_map
            .iter()
            .map(|(id, index)| (id.clone(), *index))
            .collect()
    }
}
