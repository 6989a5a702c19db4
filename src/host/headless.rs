use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SurfaceHost, SurfaceSpec};
use crate::types::errors::SurfaceError;
use crate::types::geometry::Region;
use crate::types::tab::TabId;

/// A primitive received by [`HeadlessHost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    Create { tab_id: TabId, url: String, partition: String },
    Close { tab_id: TabId },
    Show { tab_id: TabId },
    Navigate { tab_id: TabId, url: String },
    Bounds { region: Region },
    Back { tab_id: TabId },
    Forward { tab_id: TabId },
    Reload { tab_id: TabId },
    ForceReload { tab_id: TabId },
    Stop { tab_id: TabId },
}

impl HostOp {
    pub fn name(&self) -> &'static str {
        match self {
            HostOp::Create { .. } => "create",
            HostOp::Close { .. } => "close",
            HostOp::Show { .. } => "show",
            HostOp::Navigate { .. } => "navigate",
            HostOp::Bounds { .. } => "bounds",
            HostOp::Back { .. } => "back",
            HostOp::Forward { .. } => "forward",
            HostOp::Reload { .. } => "reload",
            HostOp::ForceReload { .. } => "force_reload",
            HostOp::Stop { .. } => "stop",
        }
    }
}

/// Observable state of one headless surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessSurface {
    pub url: String,
    pub partition: String,
    pub visible: bool,
    pub bounds: Region,
}

#[derive(Debug, Default)]
struct HostState {
    surfaces: HashMap<TabId, HeadlessSurface>,
    ops: Vec<HostOp>,
    faults: HashMap<String, (String, bool)>,
}

/// In-memory surface host.
///
/// Surfaces are plain records; every primitive is appended to an operation
/// log. Failures can be injected per primitive name (`"create"`, `"show"`, ...).
#[derive(Debug, Default)]
pub struct HeadlessHost {
    state: Mutex<HostState>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Logs `op` and returns the injected failure reason for it, if any.
    fn record(&self, op: HostOp) -> Result<MutexGuard<'_, HostState>, String> {
        let mut s = self.lock();
        let name = op.name();
        s.ops.push(op);
        let fault = match s.faults.get(name) {
            Some((reason, true)) => Some(reason.clone()),
            Some((_, false)) => s.faults.remove(name).map(|(reason, _)| reason),
            None => None,
        };
        match fault {
            Some(reason) => Err(reason),
            None => Ok(s),
        }
    }

    /// Fails the next `primitive` call with `reason`.
    pub fn fail_next(&self, primitive: &str, reason: &str) {
        self.lock()
            .faults
            .insert(primitive.to_string(), (reason.to_string(), false));
    }

    /// Fails every `primitive` call until [`Self::clear_faults`].
    pub fn fail_always(&self, primitive: &str, reason: &str) {
        self.lock()
            .faults
            .insert(primitive.to_string(), (reason.to_string(), true));
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    pub fn ops(&self) -> Vec<HostOp> {
        self.lock().ops.clone()
    }

    pub fn op_count(&self, name: &str) -> usize {
        self.lock().ops.iter().filter(|op| op.name() == name).count()
    }

    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    pub fn surface(&self, tab_id: &str) -> Option<HeadlessSurface> {
        self.lock().surfaces.get(tab_id).cloned()
    }

    pub fn surface_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.lock().surfaces.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn visible_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self
            .lock()
            .surfaces
            .iter()
            .filter(|(_, s)| s.visible)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn bound_primitive(&self, op: HostOp, tab_id: &str) -> Result<(), SurfaceError> {
        let s = self.record(op).map_err(SurfaceError::Host)?;
        if s.surfaces.contains_key(tab_id) {
            Ok(())
        } else {
            Err(SurfaceError::NotBound(tab_id.to_string()))
        }
    }
}

#[async_trait]
impl SurfaceHost for HeadlessHost {
    async fn create_webview(&self, spec: SurfaceSpec) -> Result<(), SurfaceError> {
        let op = HostOp::Create {
            tab_id: spec.tab_id.clone(),
            url: spec.url.clone(),
            partition: spec.partition.clone(),
        };
        let mut s = self
            .record(op)
            .map_err(|reason| SurfaceError::CreateFailed {
                tab_id: spec.tab_id.clone(),
                reason,
            })?;
        if s.surfaces.contains_key(&spec.tab_id) {
            return Ok(());
        }
        if !spec.url.is_empty() && url::Url::parse(&spec.url).is_err() {
            return Err(SurfaceError::InvalidUrl(spec.url));
        }
        s.surfaces.insert(
            spec.tab_id,
            HeadlessSurface {
                url: spec.url,
                partition: spec.partition,
                visible: false,
                bounds: spec.bounds,
            },
        );
        Ok(())
    }

    async fn close_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        let mut s = self
            .record(HostOp::Close {
                tab_id: tab_id.to_string(),
            })
            .map_err(SurfaceError::Host)?;
        s.surfaces.remove(tab_id);
        Ok(())
    }

    async fn show_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        let mut s = self
            .record(HostOp::Show {
                tab_id: tab_id.to_string(),
            })
            .map_err(|reason| SurfaceError::ShowFailed {
                tab_id: tab_id.to_string(),
                reason,
            })?;
        if !s.surfaces.contains_key(tab_id) {
            return Err(SurfaceError::NotBound(tab_id.to_string()));
        }
        for (id, surface) in s.surfaces.iter_mut() {
            surface.visible = id == tab_id;
        }
        Ok(())
    }

    async fn navigate_webview(&self, tab_id: &str, url: &str) -> Result<(), SurfaceError> {
        let mut s = self
            .record(HostOp::Navigate {
                tab_id: tab_id.to_string(),
                url: url.to_string(),
            })
            .map_err(|reason| SurfaceError::NavigateFailed {
                tab_id: tab_id.to_string(),
                reason,
            })?;
        if url::Url::parse(url).is_err() {
            return Err(SurfaceError::InvalidUrl(url.to_string()));
        }
        let surface = s
            .surfaces
            .get_mut(tab_id)
            .ok_or_else(|| SurfaceError::NotBound(tab_id.to_string()))?;
        surface.url = url.to_string();
        Ok(())
    }

    async fn update_all_webview_bounds(&self, bounds: Region) -> Result<(), SurfaceError> {
        let mut s = self
            .record(HostOp::Bounds { region: bounds })
            .map_err(SurfaceError::Host)?;
        for surface in s.surfaces.values_mut() {
            surface.bounds = bounds;
        }
        Ok(())
    }

    async fn webview_back(&self, tab_id: &str) -> Result<(), SurfaceError> {
        let op = HostOp::Back {
            tab_id: tab_id.to_string(),
        };
        self.bound_primitive(op, tab_id)
    }

    async fn webview_forward(&self, tab_id: &str) -> Result<(), SurfaceError> {
        let op = HostOp::Forward {
            tab_id: tab_id.to_string(),
        };
        self.bound_primitive(op, tab_id)
    }

    async fn reload_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        let op = HostOp::Reload {
            tab_id: tab_id.to_string(),
        };
        self.bound_primitive(op, tab_id)
    }

    async fn force_reload_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        let op = HostOp::ForceReload {
            tab_id: tab_id.to_string(),
        };
        self.bound_primitive(op, tab_id)
    }

    async fn stop_webview_loading(&self, tab_id: &str) -> Result<(), SurfaceError> {
        let op = HostOp::Stop {
            tab_id: tab_id.to_string(),
        };
        self.bound_primitive(op, tab_id)
    }
}
