// Coordinator settings: load, save, dot-path updates, reset.
// Stored as pretty JSON at the platform config path; every write is validated first.

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform;
use crate::types::errors::ConfigError;
use crate::types::settings::CoordinatorSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<CoordinatorSettings, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn get_settings(&self) -> &CoordinatorSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), ConfigError>;
    fn reset(&mut self) -> Result<(), ConfigError>;
    fn get_config_path(&self) -> &Path;
}

/// JSON-file backed settings store.
pub struct SettingsEngine {
    config_path: PathBuf,
    settings: CoordinatorSettings,
}

impl SettingsEngine {
    /// Uses `path_override` when given, otherwise `settings.json` in the platform config directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join("settings.json"));
        Self {
            config_path,
            settings: CoordinatorSettings::default(),
        }
    }

    /// Starts from `settings` instead of reading the file.
    pub fn from_settings(path_override: Option<PathBuf>, settings: CoordinatorSettings) -> Self {
        Self {
            settings,
            ..Self::new(path_override)
        }
    }
}

/// Rejects timer values below one second.
pub fn validate(settings: &CoordinatorSettings) -> Result<(), ConfigError> {
    let hk = &settings.housekeeping;
    for (name, secs) in [
        ("housekeeping.interval_secs", hk.interval_secs),
        ("housekeeping.freeze_after_secs", hk.freeze_after_secs),
        ("housekeeping.discard_after_secs", hk.discard_after_secs),
    ] {
        if secs < 1 {
            return Err(ConfigError::InvalidValue(format!(
                "{} must be at least 1 second",
                name
            )));
        }
    }
    if settings.navigation.new_tab_url.trim().is_empty() {
        return Err(ConfigError::InvalidValue(
            "navigation.new_tab_url must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl SettingsEngineTrait for SettingsEngine {
    /// Reads the config file, falling back to defaults when it does not exist.
    fn load(&mut self) -> Result<CoordinatorSettings, ConfigError> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no settings file, using defaults");
            self.settings = CoordinatorSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)?;
        let settings: CoordinatorSettings = serde_json::from_str(&content)?;
        validate(&settings)?;

        tracing::info!(path = %self.config_path.display(), "loaded settings");
        self.settings = settings;
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.config_path, json)?;
        Ok(())
    }

    fn get_settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Updates one value by dot path (`"housekeeping.freeze_after_secs"`) and saves.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), ConfigError> {
        if key.trim().is_empty() || key.split('.').any(str::is_empty) {
            return Err(ConfigError::InvalidKey(format!("'{}'", key)));
        }

        let mut tree = serde_json::to_value(&self.settings)?;
        let pointer = format!("/{}", key.replace('.', "/"));
        let slot = tree
            .pointer_mut(&pointer)
            .ok_or_else(|| ConfigError::InvalidKey(key.to_string()))?;
        *slot = value;

        let updated: CoordinatorSettings = serde_json::from_value(tree)
            .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e)))?;
        validate(&updated)?;

        self.settings = updated;
        self.save()
    }

    fn reset(&mut self) -> Result<(), ConfigError> {
        self.settings = CoordinatorSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
