use serde::{Deserialize, Serialize};

use super::tab::TabId;

/// Host primitives that act on the active surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfacePrimitive {
    Back,
    Forward,
    Reload,
    ForceReload,
    Stop,
}

/// Action bound to a notification, re-run when the user presses retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryAction {
    /// Re-run surface reconciliation for a tab.
    EnsureSurface { tab_id: TabId },
    /// Re-apply a navigation to a tab's surface.
    NavigateSurface { tab_id: TabId, url: String },
    /// Make an existing surface visible again.
    ShowSurface { tab_id: TabId },
    /// Repeat a history/reload primitive on a tab's surface.
    Primitive {
        tab_id: TabId,
        primitive: SurfacePrimitive,
    },
}

/// A non-blocking, dismissible, retryable user notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub retry: RetryAction,
}
