//! Settings persistence
//!
//! Saves and loads [`SessionSettings`] to/from a JSON file so preferences
//! survive between sessions.
//!
//! # File Location
//!
//! `settings.json` in the user's configuration directory, e.g.
//! `~/.config/chesstimeline/settings.json`. Falls back to a local
//! `settings.json` when the platform has no config directory.
//!
//! # Error Handling
//!
//! - Load failures are logged and fall back to default settings
//! - Save failures are returned to the caller

use crate::core::error::SettingsResult;
use crate::core::settings::SessionSettings;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// Resolve the settings file path
pub fn settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "trilltino", "ChessTimeline") {
        proj_dirs.config_dir().join(SETTINGS_FILENAME)
    } else {
        // Fallback to current directory
        PathBuf::from(SETTINGS_FILENAME)
    }
}

/// Load settings from the default location, using defaults on any failure
pub fn load_settings() -> SessionSettings {
    load_from(&settings_path())
}

/// Load settings from `path`, using defaults on any failure
pub fn load_from(path: &Path) -> SessionSettings {
    if !path.exists() {
        info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
        return SessionSettings::default();
    }

    match read_settings(path) {
        Ok(settings) => {
            info!("[SETTINGS] Loaded settings from {:?}", path);
            settings
        }
        Err(e) => {
            warn!(
                "[SETTINGS] Failed to load settings file at {:?}: {}. Using defaults.",
                path, e
            );
            SessionSettings::default()
        }
    }
}

/// Read settings from `path` without any fallback
pub fn read_settings(path: &Path) -> SettingsResult<SessionSettings> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save settings to the default location, returning where they were written
pub fn save_settings(settings: &SessionSettings) -> SettingsResult<PathBuf> {
    let path = settings_path();
    save_to(settings, &path)?;
    Ok(path)
}

/// Save settings as pretty JSON, creating the parent directory if needed
pub fn save_to(settings: &SessionSettings, path: &Path) -> SettingsResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    info!("[SETTINGS] Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SettingsError;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("chess_timeline_{}", uuid::Uuid::new_v4()))
            .join(SETTINGS_FILENAME)
    }

    #[test]
    fn test_save_then_load() {
        //! Saved settings load back unchanged, creating the directory
        let path = scratch_path();
        let mut settings = SessionSettings::default();
        settings.engine.difficulty = 4;
        settings.sound_effects = false;

        save_to(&settings, &path).unwrap();
        assert_eq!(load_from(&path), settings);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        assert_eq!(load_from(&scratch_path()), SessionSettings::default());
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        //! A corrupt file is reported by the strict reader and ignored by the loader
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            read_settings(&path),
            Err(SettingsError::Serialization(_))
        ));
        assert_eq!(load_from(&path), SessionSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
