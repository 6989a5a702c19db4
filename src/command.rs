//! Typed commands and their JSON method table.
//!
//! `parse_command` turns a `{"method": "...", "params": {...}}` request into a
//! [`Command`] so the driver and tests can feed the coordinator from
//! newline-delimited JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coordinator::disposition::{InputOutcome, OpenOutcome};
use crate::coordinator::housekeeping::HousekeepingReport;
use crate::coordinator::reconcile::RefreshReport;
use crate::coordinator::DragResult;
use crate::managers::drag_controller::DropTarget;
use crate::types::geometry::{Point, Region};
use crate::types::navigation::{CycleDirection, Modifiers};
use crate::types::notification::{Notification, SurfacePrimitive};
use crate::types::snapshot::Snapshot;
use crate::types::tab::{Tab, TabId};

/// Everything the coordinator can be asked to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Refresh,
    /// Backend push: the tab list changed.
    TabsChanged,
    RunHousekeeping,
    GetSnapshot,
    Activate { tab_id: TabId },
    CloseTab { tab_id: TabId },
    NewTab,
    RestoreLastClosed,
    RestoreDiscarded { tab_id: TabId },
    Cycle { direction: CycleDirection },
    OpenUrl { url: String, modifiers: Modifiers },
    SubmitInput { text: String, modifiers: Modifiers },
    Primitive { primitive: SurfacePrimitive },
    BeginDrag { tab_id: TabId },
    HoverDrag { target: Option<DropTarget> },
    DropDrag { target: DropTarget },
    EndDrag { pointer: Point, window: Region },
    RequestBounds { region: Region },
    FlushBounds,
    SyncBounds { region: Region },
    RetryNotification { id: String },
    DismissNotification { id: String },
    ListNotifications,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Refresh => "refresh",
            Command::TabsChanged => "tabs_changed",
            Command::RunHousekeeping => "run_housekeeping",
            Command::GetSnapshot => "get_snapshot",
            Command::Activate { .. } => "activate",
            Command::CloseTab { .. } => "close_tab",
            Command::NewTab => "new_tab",
            Command::RestoreLastClosed => "restore_last_closed",
            Command::RestoreDiscarded { .. } => "restore_discarded",
            Command::Cycle { .. } => "cycle",
            Command::OpenUrl { .. } => "open_url",
            Command::SubmitInput { .. } => "submit_input",
            Command::Primitive { .. } => "primitive",
            Command::BeginDrag { .. } => "begin_drag",
            Command::HoverDrag { .. } => "hover_drag",
            Command::DropDrag { .. } => "drop_drag",
            Command::EndDrag { .. } => "end_drag",
            Command::RequestBounds { .. } => "request_bounds",
            Command::FlushBounds => "flush_bounds",
            Command::SyncBounds { .. } => "sync_bounds",
            Command::RetryNotification { .. } => "retry_notification",
            Command::DismissNotification { .. } => "dismiss_notification",
            Command::ListNotifications => "list_notifications",
        }
    }
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Snapshot(Snapshot),
    Refreshed(RefreshReport),
    Housekeeping(HousekeepingReport),
    Tab(Option<Tab>),
    Opened(OpenOutcome),
    Input(InputOutcome),
    Drag(DragResult),
    Bounds { pushed: bool },
    Notifications(Vec<Notification>),
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn typed_param<T: serde::de::DeserializeOwned>(params: &Value, key: &str) -> Result<T, String> {
    let value = params.get(key).ok_or_else(|| format!("missing {}", key))?;
    serde_json::from_value(value.clone()).map_err(|e| format!("invalid {}: {}", key, e))
}

fn modifiers_param(params: &Value) -> Result<Modifiers, String> {
    match params.get("modifiers") {
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| format!("invalid modifiers: {}", e)),
        None => Ok(Modifiers::none()),
    }
}

fn region_param(params: &Value) -> Result<Region, String> {
    serde_json::from_value(params.clone()).map_err(|e| format!("invalid region: {}", e))
}

/// Maps a `namespace.op` method name and its params onto a [`Command`].
pub fn parse_command(method: &str, params: &Value) -> Result<Command, String> {
    let command = match method {
        // ─── Tabs ───
        "tabs.refresh" => Command::Refresh,
        "tabs.changed" => Command::TabsChanged,
        "tabs.snapshot" => Command::GetSnapshot,
        "tabs.activate" => Command::Activate {
            tab_id: str_param(params, "tab_id")?.to_string(),
        },
        "tabs.close" => Command::CloseTab {
            tab_id: str_param(params, "tab_id")?.to_string(),
        },
        "tabs.new" => Command::NewTab,
        "tabs.restore_closed" => Command::RestoreLastClosed,
        "tabs.restore_discarded" => Command::RestoreDiscarded {
            tab_id: str_param(params, "tab_id")?.to_string(),
        },
        "tabs.cycle" => Command::Cycle {
            direction: typed_param(params, "direction")?,
        },

        // ─── Navigation ───
        "nav.open" => Command::OpenUrl {
            url: str_param(params, "url")?.to_string(),
            modifiers: modifiers_param(params)?,
        },
        "nav.submit" => Command::SubmitInput {
            text: str_param(params, "text")?.to_string(),
            modifiers: modifiers_param(params)?,
        },
        "nav.back" => Command::Primitive {
            primitive: SurfacePrimitive::Back,
        },
        "nav.forward" => Command::Primitive {
            primitive: SurfacePrimitive::Forward,
        },
        "nav.reload" => Command::Primitive {
            primitive: SurfacePrimitive::Reload,
        },
        "nav.force_reload" => Command::Primitive {
            primitive: SurfacePrimitive::ForceReload,
        },
        "nav.stop" => Command::Primitive {
            primitive: SurfacePrimitive::Stop,
        },

        // ─── Drag ───
        "drag.begin" => Command::BeginDrag {
            tab_id: str_param(params, "tab_id")?.to_string(),
        },
        "drag.hover" => Command::HoverDrag {
            target: match params.get("target") {
                Some(Value::Null) | None => None,
                Some(_) => Some(typed_param(params, "target")?),
            },
        },
        "drag.drop" => Command::DropDrag {
            target: typed_param(params, "target")?,
        },
        "drag.end" => Command::EndDrag {
            pointer: typed_param(params, "pointer")?,
            window: typed_param(params, "window")?,
        },

        // ─── Surfaces ───
        "surface.request_bounds" => Command::RequestBounds {
            region: region_param(params)?,
        },
        "surface.flush_bounds" => Command::FlushBounds,
        "surface.bounds" => Command::SyncBounds {
            region: region_param(params)?,
        },

        // ─── Housekeeping & notifications ───
        "housekeeping.run" => Command::RunHousekeeping,
        "notifications.list" => Command::ListNotifications,
        "notifications.retry" => Command::RetryNotification {
            id: str_param(params, "id")?.to_string(),
        },
        "notifications.dismiss" => Command::DismissNotification {
            id: str_param(params, "id")?.to_string(),
        },

        _ => return Err(format!("unknown method: {}", method)),
    };
    Ok(command)
}
