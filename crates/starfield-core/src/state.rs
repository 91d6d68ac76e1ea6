//! Full-state and delta snapshot types exchanged with replicas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::delta::DeltaState;

/// Deep snapshot of a world: `{ entities, entityMap, timeStamp }`.
///
/// Entities are kept as JSON records so that kinds unknown to the receiver
/// survive decoding and can be skipped individually on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(default)]
    pub entities: Vec<Map<String, Value>>,
    #[serde(default)]
    pub entity_map: BTreeMap<String, usize>,
    #[serde(default)]
    pub time_stamp: f64,
}

/// Sent on join or on request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSnapshot {
    pub time_stamp: f64,
    pub state: SavedState,
}

/// Sent every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaSnapshot {
    pub time_stamp: f64,
    pub state: DeltaState,
}
