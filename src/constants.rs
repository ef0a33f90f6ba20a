pub const PELLET_VALUE: u32 = 10;
pub const MAX_HIGH_SCORES: usize = 5;
pub const CAMPAIGN_LENGTH: u32 = 2;

pub const FAST_TICK_MS: u64 = 100;
pub const NORMAL_TICK_MS: u64 = 200;
pub const SLOW_TICK_MS: u64 = 300;
pub const DEFAULT_TICK_MS: u64 = NORMAL_TICK_MS;

pub const MIN_TICK_MS: u64 = 20;
pub const MAX_TICK_MS: u64 = 2_000;

pub const MIN_BOARD_SIDE: usize = 2;

/// Undrained session events kept before the oldest are dropped.
pub const MAX_PENDING_EVENTS: usize = 256;

pub const LEVELS_DIR: &str = "levels";
pub const HIGH_SCORES_FILE: &str = "highscores.txt";

pub fn clamp_tick_ms(ms: u64) -> u64 {
    ms.clamp(MIN_TICK_MS, MAX_TICK_MS)
}

pub fn campaign_file_name(ordinal: u32) -> String {
    format!("level{ordinal}.txt")
}

/// `level<digits>.txt`, case-insensitive.
pub fn is_campaign_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let Some(stem) = lower.strip_suffix(".txt") else {
        return false;
    };
    is_campaign_stem(stem)
}

pub fn is_campaign_stem(stem: &str) -> bool {
    let lower = stem.to_ascii_lowercase();
    let Some(digits) = lower.strip_prefix("level") else {
        return false;
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
