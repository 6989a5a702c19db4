// Platform paths for tabweave.
// Resolved through the `dirs` crate; falls back to the temp directory when the OS reports none.

use std::path::PathBuf;

const APP_DIR: &str = "tabweave";

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(std::env::temp_dir).join(APP_DIR)
}

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/tabweave` or `~/.config/tabweave`
/// - **macOS**: `~/Library/Application Support/tabweave`
/// - **Windows**: `%APPDATA%\tabweave`
pub fn get_config_dir() -> PathBuf {
    app_dir(dirs::config_dir())
}

/// Directory under which per-site webview partitions are created.
pub fn get_data_dir() -> PathBuf {
    app_dir(dirs::data_dir())
}
