//! Command phase: drain queued input into the owning entities.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use starfield_core::commands::Command;
use starfield_core::entity::Entity;

/// Apply every queued command, last entity first. Returns the ids of
/// players whose `shooting` flag went from false to true. Queues for ids
/// with no matching player are discarded.
pub fn run(entities: &mut [Entity], queue: &mut HashMap<String, VecDeque<Command>>) -> Vec<String> {
    let mut started_shooting = Vec::new();

    for entity in entities.iter_mut().rev() {
        let Some(commands) = queue.remove(entity.id()) else {
            continue;
        };
        let Some(player) = entity.as_player_mut() else {
            continue;
        };
        if player.base.remove {
            continue;
        }
        let mut started = false;
        for command in commands.iter().filter(|c| !c.is_empty()) {
            started |= player.handle_cmd(command).started_shooting;
        }
        if started {
            started_shooting.push(player.base.id.clone());
        }
    }

    for (id, commands) in queue.drain() {
        debug!(id = %id, count = commands.len(), "discarding commands for unknown entity");
    }

    started_shooting
}
