use std::path::PathBuf;

use crate::constants::{
    clamp_tick_ms, CAMPAIGN_LENGTH, DEFAULT_TICK_MS, HIGH_SCORES_FILE, LEVELS_DIR,
    MAX_HIGH_SCORES, PELLET_VALUE,
};

pub const ENV_LEVELS_DIR: &str = "PACMAN_LEVELS_DIR";
pub const ENV_HIGH_SCORES: &str = "PACMAN_HIGH_SCORES";
pub const ENV_TICK_MS: &str = "PACMAN_TICK_MS";
pub const ENV_CAMPAIGN_LENGTH: &str = "PACMAN_CAMPAIGN_LENGTH";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub tick_ms: u64,
    pub campaign_length: u32,
    pub max_high_scores: usize,
    pub pellet_value: u32,
    pub levels_dir: PathBuf,
    pub high_scores_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            campaign_length: CAMPAIGN_LENGTH,
            max_high_scores: MAX_HIGH_SCORES,
            pellet_value: PELLET_VALUE,
            levels_dir: PathBuf::from(LEVELS_DIR),
            high_scores_path: PathBuf::from(HIGH_SCORES_FILE),
        }
    }
}

impl GameConfig {
    /// Defaults overridden by `PACMAN_*` variables. Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            tick_ms: lookup(ENV_TICK_MS)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(clamp_tick_ms)
                .unwrap_or(defaults.tick_ms),
            campaign_length: lookup(ENV_CAMPAIGN_LENGTH)
                .and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|length| *length >= 1)
                .unwrap_or(defaults.campaign_length),
            levels_dir: lookup(ENV_LEVELS_DIR)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.levels_dir),
            high_scores_path: lookup(ENV_HIGH_SCORES)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.high_scores_path),
            ..defaults
        }
    }
}
