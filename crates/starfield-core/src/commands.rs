//! Player input commands sent from clients to the simulation.
//!
//! Commands are queued per player id and drained at the next tick boundary.
//! Each field is an on/off flag; anything that is not a recognizable 0/1
//! (or boolean) is dropped field-by-field rather than rejecting the sample.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One client input sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub up: Option<u8>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub left: Option<u8>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub right: Option<u8>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub space: Option<u8>,
}

impl Command {
    /// True if no field carries a usable value.
    pub fn is_empty(&self) -> bool {
        self.up.is_none() && self.left.is_none() && self.right.is_none() && self.space.is_none()
    }
}

/// Decoded inbound client message: `{ id, cmd: [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundCommand {
    pub id: String,
    #[serde(default)]
    pub cmd: Vec<Command>,
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flag_from_value(&value))
}

/// Interpret a loosely typed JSON value as an on/off flag.
pub fn flag_from_value(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => {
            let f = n.as_f64()?;
            if !f.is_finite() {
                None
            } else if f != 0.0 {
                Some(1)
            } else {
                Some(0)
            }
        }
        _ => None,
    }
}
