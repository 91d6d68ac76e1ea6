//! Game loop thread: ticks the authoritative `Game` and publishes deltas.
//!
//! The game is moved into the thread and never shared. Commands arrive via an
//! `mpsc` channel; every tick's delta snapshot goes out on another. The clock
//! advances by elapsed wall time, so a late tick covers the time it missed,
//! up to `maxLatencyMs`. Anything beyond that is dropped.

use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use starfield_core::state::DeltaSnapshot;
use starfield_sim::Game;

use crate::state::LoopCommand;

/// Handle to a running game loop thread.
#[derive(Debug)]
pub struct GameLoopHandle {
    commands: mpsc::Sender<LoopCommand>,
    snapshots: mpsc::Receiver<DeltaSnapshot>,
    thread: JoinHandle<()>,
}

impl GameLoopHandle {
    /// Sender for the transport layer; clone freely.
    pub fn sender(&self) -> mpsc::Sender<LoopCommand> {
        self.commands.clone()
    }

    /// One delta snapshot per tick, in tick order.
    pub fn snapshots(&self) -> &mpsc::Receiver<DeltaSnapshot> {
        &self.snapshots
    }

    /// Stop the loop and wait for the thread to exit.
    pub fn shutdown(self) -> std::thread::Result<()> {
        let _ = self.commands.send(LoopCommand::Shutdown);
        self.thread.join()
    }
}

/// Spawns the game loop in a new thread, taking ownership of `game`.
pub fn spawn_game_loop(game: Game) -> std::io::Result<GameLoopHandle> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();
    let (snap_tx, snap_rx) = mpsc::channel::<DeltaSnapshot>();

    let thread = std::thread::Builder::new()
        .name("starfield-game-loop".into())
        .spawn(move || run_game_loop(game, cmd_rx, snap_tx))?;

    Ok(GameLoopHandle {
        commands: cmd_tx,
        snapshots: snap_rx,
        thread,
    })
}

/// The game loop. Runs until Shutdown or until every sender is dropped.
fn run_game_loop(
    mut game: Game,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    snap_tx: mpsc::Sender<DeltaSnapshot>,
) {
    let tick_ms = game.config().tick_ms();
    let max_latency_ms = game.config().max_latency_ms.max(0.0);
    let tick = Duration::from_secs_f64(tick_ms / 1000.0);
    let max_latency = Duration::from_secs_f64(max_latency_ms / 1000.0);
    let mut last_update = Instant::now();
    let mut next_tick_time = last_update;
    info!(tick_ms, "game loop started");

    loop {
        // 1. Drain all pending commands
        if !drain_commands(&mut game, &cmd_rx) {
            break;
        }

        // 2. Advance by the wall time since the last update
        let now = Instant::now();
        let elapsed_ms = (now - last_update).as_secs_f64() * 1000.0;
        last_update = now;
        let step = step_ms(elapsed_ms, tick_ms, max_latency_ms);
        game.update(game.time_stamp() + step);

        // 3. Publish the tick's delta; a missing listener is not fatal
        let _ = snap_tx.send(game.delta_snapshot());

        // 4. Sleep until the next deadline
        next_tick_time += tick;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > max_latency {
            warn!(
                behind_ms = (now - next_tick_time).as_secs_f64() * 1000.0,
                "tick driver fell behind, resynchronising"
            );
            next_tick_time = now;
        }
    }

    info!(updates = game.update_count(), "game loop stopped");
}

/// Simulated time for one update: the elapsed wall time, capped so that a
/// stall never turns into a single oversized step.
fn step_ms(elapsed_ms: f64, tick_ms: f64, max_latency_ms: f64) -> f64 {
    elapsed_ms.min(max_latency_ms.max(tick_ms))
}

/// Apply everything queued since the last tick. Returns false when the loop
/// should stop.
fn drain_commands(game: &mut Game, cmd_rx: &mpsc::Receiver<LoopCommand>) -> bool {
    loop {
        match cmd_rx.try_recv() {
            Ok(LoopCommand::Queue { id, commands }) => game.queue_command(&id, commands),
            Ok(LoopCommand::Join { id, data, reply }) => {
                let result = game.join(&id, data.as_ref()).map(|_| ());
                if let Err(err) = &result {
                    debug!(id = %id, error = %err, "join refused");
                }
                let _ = reply.send(result.map(|()| game.full_snapshot()));
            }
            Ok(LoopCommand::Leave { id }) => {
                game.leave(&id);
            }
            Ok(LoopCommand::RequestState { reply }) => {
                let _ = reply.send(game.full_snapshot());
            }
            Ok(LoopCommand::Shutdown) => return false,
            Err(mpsc::TryRecvError::Empty) => return true,
            Err(mpsc::TryRecvError::Disconnected) => return false,
        }
    }
}
