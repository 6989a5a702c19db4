use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::geometry::Region;

/// Top-level coordinator settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoordinatorSettings {
    #[serde(default)]
    pub housekeeping: HousekeepingSettings,
    #[serde(default)]
    pub surfaces: SurfaceSettings,
    #[serde(default)]
    pub navigation: NavigationSettings,
}

/// Idle reclamation thresholds and timer period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HousekeepingSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub freeze_after_secs: u64,
    pub discard_after_secs: u64,
}

impl Default for HousekeepingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            freeze_after_secs: 5 * 60,
            discard_after_secs: 30 * 60,
        }
    }
}

impl HousekeepingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn freeze_after(&self) -> Duration {
        Duration::from_secs(self.freeze_after_secs)
    }

    pub fn discard_after(&self) -> Duration {
        Duration::from_secs(self.discard_after_secs)
    }
}

/// Surface layout and retention policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurfaceSettings {
    pub default_region: Region,
    /// Keep hidden surfaces for background tabs until housekeeping freezes them.
    #[serde(default)]
    pub retain_background_surfaces: bool,
    #[serde(default = "default_true")]
    pub recreate_on_cross_origin: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            default_region: Region::default(),
            retain_background_surfaces: false,
            recreate_on_cross_origin: true,
        }
    }
}

/// Navigation defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationSettings {
    pub new_tab_url: String,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            new_tab_url: "about:blank".to_string(),
        }
    }
}
