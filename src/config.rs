//! Engine configuration.

use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::game::state::RunConfig;

/// Save file location.
pub const ENV_SAVE: &str = "STAR_RUNNER_SAVE";
/// Seed for run and quest randomness.
pub const ENV_SEED: &str = "STAR_RUNNER_SEED";
/// Frames the headless demo simulates.
pub const ENV_FRAMES: &str = "STAR_RUNNER_FRAMES";

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// JSON save file
    pub save_path: PathBuf,
    /// Root seed; runs and daily quests derive from it
    pub seed: u64,
    /// Frame duration in milliseconds
    pub frame_ms: f32,
    /// Frame budget for the headless demo
    pub demo_frames: u32,
    /// Physics and spawn constants
    pub run: RunConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("star-runner-save.json"),
            seed: 0x5eed_5eed,
            frame_ms: 1000.0 / crate::FRAME_RATE as f32,
            demo_frames: 60 * crate::FRAME_RATE,
            run: RunConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            save_path: lookup(ENV_SAVE).map(PathBuf::from).unwrap_or(defaults.save_path),
            seed: parse_or(&lookup, ENV_SEED, defaults.seed),
            demo_frames: parse_or(&lookup, ENV_FRAMES, defaults.demo_frames),
            ..defaults
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            default
        }),
        None => default,
    }
}
