//! Per-tick change tracking.
//!
//! Every externally visible mutation is written here as a field-level change
//! keyed `[scope][entityId][field]`. The simulation takes the accumulated
//! state once per tick and ships it to replicas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::GameEvent;

/// Changed fields for one entity.
pub type FieldMap = Map<String, Value>;

/// Accumulated changes and events, in wire form:
/// `{ scope: { id: { field: value } }, events: [[name, id, ...args]] }`.
///
/// A removed entity carries `remove: true` in its field map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaState {
    #[serde(flatten)]
    pub scopes: BTreeMap<String, BTreeMap<String, FieldMap>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GameEvent>,
}

impl DeltaState {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.scopes.values().all(|s| s.is_empty())
    }

    /// Changes recorded for one entity, if any.
    pub fn entry(&self, scope: &str, id: &str) -> Option<&FieldMap> {
        self.scopes.get(scope).and_then(|s| s.get(id))
    }
}

/// Change sink passed to every mutating entity operation.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    state: DeltaState,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single field change. Later writes to the same field win.
    pub fn register_change(&mut self, scope: &str, id: &str, field: &str, value: Value) {
        self.state
            .scopes
            .entry(scope.to_owned())
            .or_default()
            .entry(id.to_owned())
            .or_default()
            .insert(field.to_owned(), value);
    }

    /// Replace everything recorded for `id` with a full record.
    pub fn register_object(&mut self, scope: &str, id: &str, record: FieldMap) {
        self.state
            .scopes
            .entry(scope.to_owned())
            .or_default()
            .insert(id.to_owned(), record);
    }

    pub fn register_event(&mut self, event: GameEvent) {
        self.state.events.push(event);
    }

    /// Hand over everything accumulated so far and start empty.
    pub fn take(&mut self) -> DeltaState {
        std::mem::take(&mut self.state)
    }

    pub fn reset(&mut self) {
        self.state = DeltaState::default();
    }

    pub fn state(&self) -> &DeltaState {
        &self.state
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::events::DESTROY;

    #[test]
    fn test_field_changes_merge_per_entity() {
        let mut tracker = DeltaTracker::new();
        tracker.register_change("entities", "p1", "shield", json!(90.0));
        tracker.register_change("entities", "p1", "angle", json!(0.5));
        tracker.register_change("entities", "p1", "shield", json!(85.0));

        let entry = tracker.state().entry("entities", "p1").unwrap();
        assert_eq!(entry.len(), 2);
        assert_eq!(entry["shield"], json!(85.0));
    }

    #[test]
    fn test_register_object_replaces_entry() {
        let mut tracker = DeltaTracker::new();
        tracker.register_change("entities", "b1", "pos", json!([1.0, 2.0, 0.0]));
        let mut record = FieldMap::new();
        record.insert("type".into(), json!("bullet"));
        tracker.register_object("entities", "b1", record);

        let entry = tracker.state().entry("entities", "b1").unwrap();
        assert!(entry.get("pos").is_none());
        assert_eq!(entry["type"], json!("bullet"));
    }

    #[test]
    fn test_take_resets_and_serializes() {
        let mut tracker = DeltaTracker::new();
        tracker.register_change("entities", "rock", "remove", json!(true));
        tracker.register_event(GameEvent::new(DESTROY, "rock", vec![]));

        let taken = tracker.take();
        assert!(tracker.is_empty());
        let wire = serde_json::to_value(&taken).unwrap();
        assert_eq!(
            wire,
            json!({"entities": {"rock": {"remove": true}}, "events": [["destroy", "rock"]]})
        );
        let back: DeltaState = serde_json::from_value(wire).unwrap();
        assert_eq!(back, taken);
    }

    #[test]
    fn test_empty_state_omits_events() {
        let wire = serde_json::to_value(DeltaState::default()).unwrap();
        assert_eq!(wire, json!({}));
    }
}
