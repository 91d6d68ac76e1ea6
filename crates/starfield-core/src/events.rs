//! Discrete game events and the named-handler dispatcher.
//!
//! On the wire an event is a flat array `[name, entityId, ...args]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An entity was destroyed. Args: none.
pub const DESTROY: &str = "destroy";
/// A bullet hit an entity. Args: `[bulletId, ownerId]`.
pub const HIT: &str = "hit";
/// Two entities exchanged an elastic impulse. Args: `[otherId]`.
pub const COLLISION: &str = "collision";
/// A powerup was consumed. Args: `[subtype, playerId]`.
pub const POWERUP: &str = "powerup";

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Value>", try_from = "Vec<Value>")]
pub struct GameEvent {
    pub name: String,
    pub entity_id: String,
    pub args: Vec<Value>,
}

impl GameEvent {
    pub fn new(name: impl Into<String>, entity_id: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            entity_id: entity_id.into(),
            args,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventDecodeError {
    #[error("event array has {0} elements, expected at least 2")]
    TooShort(usize),
    #[error("event name must be a string")]
    BadName,
    #[error("event entity id must be a string")]
    BadEntityId,
}

impl From<GameEvent> for Vec<Value> {
    fn from(event: GameEvent) -> Self {
        let mut out = Vec::with_capacity(event.args.len() + 2);
        out.push(Value::String(event.name));
        out.push(Value::String(event.entity_id));
        out.extend(event.args);
        out
    }
}

impl TryFrom<Vec<Value>> for GameEvent {
    type Error = EventDecodeError;

    fn try_from(values: Vec<Value>) -> Result<Self, Self::Error> {
        if values.len() < 2 {
            return Err(EventDecodeError::TooShort(values.len()));
        }
        let mut iter = values.into_iter();
        let name = match iter.next() {
            Some(Value::String(s)) => s,
            _ => return Err(EventDecodeError::BadName),
        };
        let entity_id = match iter.next() {
            Some(Value::String(s)) => s,
            _ => return Err(EventDecodeError::BadEntityId),
        };
        Ok(Self {
            name,
            entity_id,
            args: iter.collect(),
        })
    }
}

type Handler = Box<dyn FnMut(&GameEvent) + Send>;

/// Named handler registry. Handlers for a name run in bind order;
/// events with no bound handler are dropped.
#[derive(Default)]
pub struct EventHandler {
    handlers: HashMap<String, Vec<Handler>>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.handlers
            .entry(name.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Remove every handler bound to `name`. Returns whether any existed.
    pub fn unbind(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn fire(&mut self, event: &GameEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.name) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.handlers.get(name).is_some_and(|h| !h.is_empty())
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("EventHandler").field("bound", &names).finish()
    }
}
