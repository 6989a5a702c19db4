//! Integration-level unit tests for the SettingsEngine public API.
//!
//! Covers default loading, persistence of dot-path updates, validation of
//! timer values and reset.

use rstest::rstest;
use serde_json::json;
use tabweave::services::settings_engine::{validate, SettingsEngine, SettingsEngineTrait};
use tabweave::types::errors::ConfigError;
use tabweave::types::settings::{CoordinatorSettings, SurfaceSettings};
use tempfile::TempDir;

/// The caller holds the `TempDir` so the file outlives the engine.
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    SettingsEngine::new(Some(dir.path().join("settings.json")))
}

#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, CoordinatorSettings::default());
    assert!(
        !dir.path().join("settings.json").exists(),
        "loading defaults must not create the file"
    );
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value("housekeeping.freeze_after_secs", json!(120))
            .unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    let settings = engine.load().unwrap();
    assert_eq!(settings.housekeeping.freeze_after_secs, 120);
    assert_eq!(
        settings.housekeeping.discard_after_secs,
        CoordinatorSettings::default().housekeeping.discard_after_secs
    );
}

#[test]
fn test_set_value_nested_region() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine
        .set_value("surfaces.default_region.width", json!(640.0))
        .unwrap();
    assert_eq!(engine.get_settings().surfaces.default_region.width, 640.0);
}

#[rstest]
#[case("")]
#[case("housekeeping.")]
#[case(".enabled")]
#[case("housekeeping.nonexistent")]
#[case("nothing.here")]
fn test_set_value_rejects_unknown_keys(#[case] key: &str) {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let err = engine.set_value(key, json!(1)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKey(_)), "{key}: {err}");
}

#[rstest]
#[case("housekeeping.interval_secs", json!(0))]
#[case("housekeeping.freeze_after_secs", json!(0))]
#[case("housekeeping.discard_after_secs", json!(0))]
#[case("housekeeping.enabled", json!("yes"))]
#[case("navigation.new_tab_url", json!("   "))]
fn test_set_value_rejects_invalid_values(#[case] key: &str, #[case] value: serde_json::Value) {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let err = engine.set_value(key, value).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue(_)), "{key}: {err}");
    assert_eq!(
        engine.get_settings(),
        &CoordinatorSettings::default(),
        "a rejected update must leave settings untouched"
    );
}

#[test]
fn test_load_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let mut settings = CoordinatorSettings::default();
    settings.housekeeping.interval_secs = 0;
    std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();

    let mut engine = SettingsEngine::new(Some(path));
    assert!(matches!(engine.load(), Err(ConfigError::InvalidValue(_))));
}

#[test]
fn test_load_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut engine = SettingsEngine::new(Some(path));
    assert!(matches!(engine.load(), Err(ConfigError::Serialization(_))));
}

#[test]
fn test_partial_file_fills_missing_sections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"housekeeping":{"enabled":false,"interval_secs":5,"freeze_after_secs":10,"discard_after_secs":20}}"#,
    )
    .unwrap();

    let mut engine = SettingsEngine::new(Some(path));
    let settings = engine.load().unwrap();
    assert!(!settings.housekeeping.enabled);
    assert_eq!(settings.surfaces, SurfaceSettings::default());
    assert_eq!(settings.navigation.new_tab_url, "about:blank");
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine
        .set_value("surfaces.retain_background_surfaces", json!(true))
        .unwrap();

    engine.reset().unwrap();

    assert_eq!(engine.get_settings(), &CoordinatorSettings::default());
    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), CoordinatorSettings::default());
}

#[test]
fn test_config_path_override() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);
    assert_eq!(engine.get_config_path(), dir.path().join("settings.json"));
}

#[test]
fn test_from_settings_skips_file() {
    let mut settings = CoordinatorSettings::default();
    settings.navigation.new_tab_url = "https://start.example".to_string();
    let engine = SettingsEngine::from_settings(None, settings.clone());
    assert_eq!(engine.get_settings(), &settings);
}

#[test]
fn test_validate_accepts_defaults() {
    assert!(validate(&CoordinatorSettings::default()).is_ok());
}
