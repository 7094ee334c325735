//! Session settings
//!
//! User preferences that survive restarts. Serialized as JSON by
//! [`crate::core::settings_persistence`]. Every field has a default so older
//! or partial files still load.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Preferences for a game session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Attach feedback cues to move events
    pub sound_effects: bool,
    /// External engine configuration for games against the computer
    pub engine: EngineSettings,
    /// Delay before a puzzle's scripted reply is played
    pub puzzle_reply_delay_ms: u64,
    /// Default `tracing` filter; `RUST_LOG` overrides it
    pub log_filter: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sound_effects: true,
            engine: EngineSettings::default(),
            puzzle_reply_delay_ms: 1000,
            log_filter: "info".to_string(),
        }
    }
}

/// UCI engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Path to the UCI engine executable
    pub binary_path: PathBuf,
    /// Difficulty level, 0 (easiest) to 4 (hardest)
    pub difficulty: u8,
    pub threads: u32,
    pub hash_mb: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("stockfish"),
            difficulty: 2,
            threads: 1,
            hash_mb: 16,
        }
    }
}
