//! Core infrastructure shared by every game mode
//!
//! - `error` - [`GameError`] and [`SettingsError`]
//! - `settings` / `settings_persistence` - user preferences and their JSON file
//! - `logging` - `tracing` subscriber setup

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_persistence;

pub use error::{GameError, GameResult, SettingsError, SettingsResult};
pub use logging::init_logging;
pub use settings::{EngineSettings, SessionSettings};
pub use settings_persistence::{load_settings, save_settings};
