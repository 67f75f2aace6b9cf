//! Session configuration
//!
//! Defaults come from the gravity and well constants; every field can be
//! overridden from the environment. Values that fail to parse fall back to the
//! default.

use std::env;

use crate::core::WellConfig;
use crate::types::FRAMES_PER_SECOND;

/// Default bound on buffered out-of-order actions per player chain
pub const MAX_BUFFERED_ACTIONS: usize = 256;

/// Default period of the gap check, in milliseconds
pub const BACKFILL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub well: WellConfig,
    pub max_buffered_actions: usize,
    pub frames_per_second: u32,
    pub backfill_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            well: WellConfig::default(),
            max_buffered_actions: MAX_BUFFERED_ACTIONS,
            frames_per_second: FRAMES_PER_SECOND,
            backfill_interval_ms: BACKFILL_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    /// Create from environment variables
    ///
    /// - `FLATRIS_WELL_ROWS`, `FLATRIS_WELL_COLS`: well dimensions
    /// - `FLATRIS_DROP_FRAMES`: frames per row at game start
    /// - `FLATRIS_MAX_BUFFERED`: out-of-order actions kept per player
    /// - `FLATRIS_FPS`: frame rate of the local gravity clock
    /// - `FLATRIS_BACKFILL_MS`: gap check period
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let well = WellConfig {
            rows: env_or("FLATRIS_WELL_ROWS", defaults.well.rows).max(1),
            cols: env_or("FLATRIS_WELL_COLS", defaults.well.cols).max(1),
            drop_frames_default: env_or("FLATRIS_DROP_FRAMES", defaults.well.drop_frames_default),
            ..defaults.well
        };

        Self {
            well,
            max_buffered_actions: env_or("FLATRIS_MAX_BUFFERED", defaults.max_buffered_actions)
                .max(1),
            frames_per_second: env_or("FLATRIS_FPS", defaults.frames_per_second).max(1),
            backfill_interval_ms: env_or("FLATRIS_BACKFILL_MS", defaults.backfill_interval_ms)
                .max(1),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
