//! Native surface host contract.
//!
//! A host owns the platform webviews of one window. Every primitive is keyed
//! by tab id; the host never decides which tab is visible on its own.

pub mod headless;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::errors::SurfaceError;
use crate::types::geometry::Region;
use crate::types::tab::TabId;

/// Everything a host needs to create one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSpec {
    pub tab_id: TabId,
    pub url: String,
    /// Storage partition name, see [`partition_key`].
    pub partition: String,
    pub bounds: Region,
}

impl SurfaceSpec {
    pub fn new(tab_id: &str, url: &str, bounds: Region) -> Self {
        Self {
            tab_id: tab_id.to_string(),
            url: url.to_string(),
            partition: partition_key(url),
            bounds,
        }
    }
}

/// Primitives a platform surface host provides.
///
/// `create_webview` starts the surface hidden and is a no-op when one already
/// exists for the tab. `close_webview` is idempotent. `show_webview` hides
/// every other surface of the window.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    async fn create_webview(&self, spec: SurfaceSpec) -> Result<(), SurfaceError>;
    async fn close_webview(&self, tab_id: &str) -> Result<(), SurfaceError>;
    async fn show_webview(&self, tab_id: &str) -> Result<(), SurfaceError>;
    async fn navigate_webview(&self, tab_id: &str, url: &str) -> Result<(), SurfaceError>;
    async fn update_all_webview_bounds(&self, bounds: Region) -> Result<(), SurfaceError>;
    async fn webview_back(&self, tab_id: &str) -> Result<(), SurfaceError>;
    async fn webview_forward(&self, tab_id: &str) -> Result<(), SurfaceError>;
    async fn reload_webview(&self, tab_id: &str) -> Result<(), SurfaceError>;
    /// Reload bypassing the cache; hosts without support fall back to a plain reload.
    async fn force_reload_webview(&self, tab_id: &str) -> Result<(), SurfaceError>;
    async fn stop_webview_loading(&self, tab_id: &str) -> Result<(), SurfaceError>;
}

/// Storage partition for a URL: its lowercased host with every character
/// outside `[A-Za-z0-9.-]` replaced by `_`, or `blank` when there is no host.
pub fn partition_key(url: &str) -> String {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "blank".to_string());

    host.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Data directory for a partition under `base`.
pub fn partition_dir(base: &Path, partition: &str) -> PathBuf {
    base.join("webview-partitions").join(partition)
}
