//! Startup configuration: optional JSON file plus environment overrides.
//!
//! Resolution order, later wins:
//! 1. `GameConfig::default()`
//! 2. the JSON file named by `STARFIELD_CONFIG`, when set
//! 3. individual `STARFIELD_*` variables

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use starfield_sim::GameConfig;

pub const CONFIG_PATH_VAR: &str = "STARFIELD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}

/// Load `.env` when present, then resolve the config from the process
/// environment.
pub fn load_config() -> Result<GameConfig, ConfigError> {
    // Safe to ignore when not present.
    let _ = dotenvy::dotenv();
    resolve(|var| env::var(var).ok())
}

/// Resolve the config against an arbitrary variable lookup.
pub fn resolve<F>(lookup: F) -> Result<GameConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_VAR) {
        Some(path) if !path.trim().is_empty() => read_file(Path::new(path.trim()))?,
        _ => GameConfig::default(),
    };

    override_with(&lookup, "STARFIELD_WIDTH", &mut config.width)?;
    override_with(&lookup, "STARFIELD_HEIGHT", &mut config.height)?;
    override_with(&lookup, "STARFIELD_TICK_RATE_HZ", &mut config.tick_rate_hz)?;
    override_with(&lookup, "STARFIELD_BOT_COUNT", &mut config.bot_count)?;
    override_with(&lookup, "STARFIELD_MAX_LATENCY_MS", &mut config.max_latency_ms)?;
    override_with(&lookup, "STARFIELD_SEED", &mut config.seed)?;

    Ok(config)
}

pub fn read_file(path: &Path) -> Result<GameConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })
}

fn override_with<F, T>(lookup: &F, var: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(var) else {
        return Ok(());
    };
    *slot = value.trim().parse().map_err(|_| ConfigError::Env { var, value })?;
    Ok(())
}
