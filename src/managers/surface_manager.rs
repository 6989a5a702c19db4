//! Surface Manager.
//!
//! Owns the registry of native surfaces, one per tab id, and is the only
//! place that mutates it. Also keeps every surface aligned to the content
//! region and decides between in-place navigation and recreation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::{SurfaceHost, SurfaceSpec};
use crate::types::errors::SurfaceError;
use crate::types::geometry::Region;
use crate::types::notification::SurfacePrimitive;
use crate::types::snapshot::Placeholder;
use crate::types::tab::{Tab, TabId, TabState};

/// What the registry remembers about a live surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRecord {
    pub url: String,
    pub partition: String,
}

/// How a navigation was applied to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigateMode {
    InPlace,
    /// The host changed, so the surface was torn down and built again.
    Recreated,
    /// No surface existed; one was created at the URL.
    Created,
}

pub struct SurfaceManager {
    host: Arc<dyn SurfaceHost>,
    registry: HashMap<TabId, SurfaceRecord>,
    /// Region new surfaces are created with.
    region: Region,
    last_pushed: Option<Region>,
    pending_region: Option<Region>,
    placeholder: Option<Placeholder>,
    recreate_on_cross_origin: bool,
}

fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

fn surface_url(url: &str) -> &str {
    if url.trim().is_empty() {
        "about:blank"
    } else {
        url
    }
}

impl SurfaceManager {
    pub fn new(host: Arc<dyn SurfaceHost>, region: Region, recreate_on_cross_origin: bool) -> Self {
        Self {
            host,
            registry: HashMap::new(),
            region,
            last_pushed: None,
            pending_region: None,
            placeholder: None,
            recreate_on_cross_origin,
        }
    }

    pub fn is_bound(&self, tab_id: &str) -> bool {
        self.registry.contains_key(tab_id)
    }

    pub fn record(&self, tab_id: &str) -> Option<&SurfaceRecord> {
        self.registry.get(tab_id)
    }

    pub fn bound_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.registry.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    pub fn clear_placeholder(&mut self) {
        self.placeholder = None;
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Makes `tab`'s surface exist and be the visible one.
    ///
    /// A discarded tab gets its surface closed and a placeholder instead.
    pub async fn ensure(&mut self, tab: &Tab) -> Result<(), SurfaceError> {
        if tab.state == TabState::Discarded {
            self.teardown(&tab.id).await?;
            self.placeholder = Some(Placeholder {
                tab_id: tab.id.clone(),
                title: tab.display_title().to_string(),
                url: tab.url.clone(),
            });
            return Ok(());
        }
        self.placeholder = None;

        if !self.is_bound(&tab.id) {
            self.create(&tab.id, surface_url(&tab.url)).await?;
        }
        self.show(&tab.id).await
    }

    pub async fn show(&mut self, tab_id: &str) -> Result<(), SurfaceError> {
        if !self.is_bound(tab_id) {
            return Err(SurfaceError::NotBound(tab_id.to_string()));
        }
        self.host.show_webview(tab_id).await?;
        tracing::debug!(tab_id = %tab_id, "surface shown");
        Ok(())
    }

    async fn create(&mut self, tab_id: &str, url: &str) -> Result<(), SurfaceError> {
        let spec = SurfaceSpec::new(tab_id, url, self.region);
        let partition = spec.partition.clone();
        self.host.create_webview(spec).await?;
        tracing::info!(tab_id = %tab_id, url = %url, partition = %partition, "surface created");
        self.registry.insert(
            tab_id.to_string(),
            SurfaceRecord {
                url: url.to_string(),
                partition,
            },
        );
        Ok(())
    }

    /// Closes the tab's surface. Returns whether one was bound.
    pub async fn teardown(&mut self, tab_id: &str) -> Result<bool, SurfaceError> {
        if !self.is_bound(tab_id) {
            return Ok(false);
        }
        self.host.close_webview(tab_id).await?;
        self.registry.remove(tab_id);
        tracing::info!(tab_id = %tab_id, "surface closed");
        Ok(true)
    }

    /// Closes every surface, continuing past failures. Returns the first failure.
    pub async fn teardown_all(&mut self) -> Result<(), SurfaceError> {
        let mut first_err = None;
        for id in self.bound_ids() {
            if let Err(e) = self.teardown(&id).await {
                tracing::warn!(tab_id = %id, error = %e, "failed to close surface");
                first_err.get_or_insert(e);
            }
        }
        self.placeholder = None;
        first_err.map_or(Ok(()), Err)
    }

    /// Pushes `region` to every surface. Returns whether a push happened.
    ///
    /// Degenerate regions and a region equal to the last pushed one are skipped.
    pub async fn sync_bounds(&mut self, region: Region) -> Result<bool, SurfaceError> {
        if region.is_degenerate() || self.last_pushed == Some(region) {
            return Ok(false);
        }
        self.host.update_all_webview_bounds(region).await?;
        self.last_pushed = Some(region);
        self.region = region;
        Ok(true)
    }

    /// Queues a region for the next [`Self::flush_bounds`]; later requests replace earlier ones.
    pub fn request_bounds(&mut self, region: Region) {
        self.pending_region = Some(region);
    }

    pub async fn flush_bounds(&mut self) -> Result<bool, SurfaceError> {
        match self.pending_region.take() {
            Some(region) => self.sync_bounds(region).await,
            None => Ok(false),
        }
    }

    /// Points the tab's surface at `url`.
    ///
    /// A different host means a different storage partition, so the surface is
    /// rebuilt rather than navigated when cross-origin recreation is enabled.
    pub async fn navigate(&mut self, tab_id: &str, url: &str) -> Result<NavigateMode, SurfaceError> {
        let url = surface_url(url);
        let Some(current) = self.registry.get(tab_id) else {
            self.create(tab_id, url).await?;
            self.show(tab_id).await?;
            return Ok(NavigateMode::Created);
        };

        if self.recreate_on_cross_origin && host_of(&current.url) != host_of(url) {
            tracing::debug!(tab_id = %tab_id, from = %current.url, to = %url, "cross-origin navigation");
            self.teardown(tab_id).await?;
            self.create(tab_id, url).await?;
            self.show(tab_id).await?;
            return Ok(NavigateMode::Recreated);
        }

        self.host.navigate_webview(tab_id, url).await?;
        if let Some(record) = self.registry.get_mut(tab_id) {
            record.url = url.to_string();
        }
        Ok(NavigateMode::InPlace)
    }

    /// Runs a history/reload/stop primitive on a bound surface.
    pub async fn primitive(
        &mut self,
        tab_id: &str,
        primitive: SurfacePrimitive,
    ) -> Result<(), SurfaceError> {
        if !self.is_bound(tab_id) {
            return Err(SurfaceError::NotBound(tab_id.to_string()));
        }
        match primitive {
            SurfacePrimitive::Back => self.host.webview_back(tab_id).await,
            SurfacePrimitive::Forward => self.host.webview_forward(tab_id).await,
            SurfacePrimitive::Reload => self.host.reload_webview(tab_id).await,
            SurfacePrimitive::ForceReload => self.host.force_reload_webview(tab_id).await,
            SurfacePrimitive::Stop => self.host.stop_webview_loading(tab_id).await,
        }
    }
}
