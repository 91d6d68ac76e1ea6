use std::process::ExitCode;

use starfield_app::{config, game_loop, telemetry};
use starfield_sim::{world_setup, Game};

/// Snapshots between progress lines at the default tick rate.
const REPORT_EVERY: u64 = 300;

fn main() -> ExitCode {
    let config = config::load_config();
    telemetry::init_tracing();
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut game = Game::new(config);
    world_setup::seed_level(&mut game);

    let handle = match game_loop::spawn_game_loop(game) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "failed to spawn game loop");
            return ExitCode::FAILURE;
        }
    };

    // Headless: no transport is attached, so just report activity.
    let mut ticks = 0u64;
    for snapshot in handle.snapshots().iter() {
        ticks += 1;
        if ticks % REPORT_EVERY == 0 {
            let changed: usize = snapshot.state.scopes.values().map(|s| s.len()).sum();
            tracing::info!(
                ticks,
                time_stamp = snapshot.time_stamp,
                changed,
                events = snapshot.state.events.len(),
                "tick"
            );
        }
    }

    ExitCode::SUCCESS
}
