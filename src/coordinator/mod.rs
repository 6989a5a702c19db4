//! Tab & Surface Lifecycle Coordinator.
//!
//! Keeps backend tab records and local rendering surfaces in agreement.
//! Every user operation asks the backend for a transition and then runs one
//! reconciler pass ([`Coordinator::refresh`]); the backend's answer always wins.
//!
//! The coordinator is plain `&mut self` state. Serialization of passes comes
//! from [`crate::runtime`], which owns it inside a single task.

pub mod disposition;
pub mod housekeeping;
pub mod reconcile;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::{Command, Outcome};
use crate::gateway::RemoteStateGateway;
use crate::host::SurfaceHost;
use crate::managers::drag_controller::{DragController, DragControllerTrait, DragOutcome, DropTarget};
use crate::managers::idle_tracker::{IdleTracker, IdleTrackerTrait};
use crate::managers::notification_center::{NotificationCenter, NotificationCenterTrait};
use crate::managers::surface_manager::SurfaceManager;
use crate::services::clock::Clock;
use crate::types::errors::{CoordinatorError, ErrorClass, SurfaceError};
use crate::types::event::UiEvent;
use crate::types::geometry::{Point, Region};
use crate::types::navigation::{CycleDirection, NewWindowInfo};
use crate::types::notification::{Notification, RetryAction, SurfacePrimitive};
use crate::types::settings::CoordinatorSettings;
use crate::types::snapshot::Snapshot;
use crate::types::tab::Tab;

/// Result of finishing a drag gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragResult {
    pub outcome: DragOutcome,
    /// Set when the tab was detached into a new window.
    pub window: Option<NewWindowInfo>,
}

pub struct Coordinator {
    gateway: Arc<dyn RemoteStateGateway>,
    surfaces: SurfaceManager,
    idle: IdleTracker,
    drag: DragController,
    notifications: NotificationCenter,
    clock: Arc<dyn Clock>,
    settings: CoordinatorSettings,
    snapshot: Snapshot,
    outbox: Vec<UiEvent>,
}

/// Position reached by cycling from `current` in a strip of `len` tabs, wrapping at both ends.
///
/// With no current tab, forward starts at the first tab and backward at the last.
pub fn cycle_index(len: usize, current: Option<usize>, direction: CycleDirection) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match (current, direction) {
        (None, CycleDirection::Forward) => 0,
        (None, CycleDirection::Backward) => len - 1,
        (Some(i), CycleDirection::Forward) => (i + 1) % len,
        (Some(i), CycleDirection::Backward) => (i % len + len - 1) % len,
    };
    Some(next)
}

/// Which retry re-runs a failed surface reconciliation.
fn ensure_retry(tab_id: &str, err: &SurfaceError) -> RetryAction {
    match err {
        SurfaceError::ShowFailed { .. } => RetryAction::ShowSurface {
            tab_id: tab_id.to_string(),
        },
        _ => RetryAction::EnsureSurface {
            tab_id: tab_id.to_string(),
        },
    }
}

fn log_failure(operation: &str, err: &CoordinatorError) {
    match err.class() {
        ErrorClass::TransientIo => tracing::warn!(operation, error = %err, "operation failed"),
        ErrorClass::OperationRejected => {
            tracing::info!(operation, error = %err, "backend rejected operation")
        }
        ErrorClass::StateDesync => tracing::debug!(operation, error = %err, "stale local state"),
    }
}

impl Coordinator {
    pub fn new(
        gateway: Arc<dyn RemoteStateGateway>,
        host: Arc<dyn SurfaceHost>,
        clock: Arc<dyn Clock>,
        settings: CoordinatorSettings,
    ) -> Self {
        let surfaces = SurfaceManager::new(
            host,
            settings.surfaces.default_region,
            settings.surfaces.recreate_on_cross_origin,
        );
        Self {
            gateway,
            surfaces,
            idle: IdleTracker::new(),
            drag: DragController::new(),
            notifications: NotificationCenter::new(),
            clock,
            settings,
            snapshot: Snapshot {
                is_empty: true,
                ..Snapshot::default()
            },
            outbox: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn surfaces(&self) -> &SurfaceManager {
        &self.surfaces
    }

    pub fn idle(&self) -> &IdleTracker {
        &self.idle
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.list()
    }

    /// Drains the UI events produced since the last call.
    pub fn take_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, event: UiEvent) {
        self.outbox.push(event);
    }

    fn raise(&mut self, err: &SurfaceError, retry: RetryAction) {
        tracing::warn!(error = %err, "surface failure, offering retry");
        let notification = self.notifications.raise(&err.to_string(), retry);
        self.emit(UiEvent::NotificationRaised(notification));
    }

    /// Ends a user operation: logs a failure by class, then re-reads the backend.
    async fn finish<T>(
        &mut self,
        operation: &str,
        result: Result<T, CoordinatorError>,
    ) -> Result<T, CoordinatorError> {
        if let Err(e) = &result {
            log_failure(operation, e);
        }
        self.refresh().await;
        result
    }

    fn active_id(&self) -> Result<String, CoordinatorError> {
        self.snapshot
            .active_id
            .clone()
            .ok_or(CoordinatorError::NoActiveTab)
    }

    // === Dispatch ===

    /// Runs one command. This is the single entry point used by the runtime and the driver.
    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome, CoordinatorError> {
        tracing::debug!(command = command.name(), "dispatch");
        match command {
            Command::Refresh | Command::TabsChanged => Ok(Outcome::Refreshed(self.refresh().await)),
            Command::RunHousekeeping => Ok(Outcome::Housekeeping(self.run_housekeeping().await)),
            Command::GetSnapshot => Ok(Outcome::Snapshot(self.snapshot.clone())),
            Command::Activate { tab_id } => self.activate(&tab_id).await.map(|t| Outcome::Tab(Some(t))),
            Command::CloseTab { tab_id } => self.close_tab(&tab_id).await.map(|_| Outcome::Done),
            Command::NewTab => self.new_tab().await.map(|t| Outcome::Tab(Some(t))),
            Command::RestoreLastClosed => self.restore_last_closed().await.map(Outcome::Tab),
            Command::RestoreDiscarded { tab_id } => self
                .restore_discarded(&tab_id)
                .await
                .map(|t| Outcome::Tab(Some(t))),
            Command::Cycle { direction } => self.cycle(direction).await.map(Outcome::Tab),
            Command::OpenUrl { url, modifiers } => {
                self.open_url(&url, modifiers).await.map(Outcome::Opened)
            }
            Command::SubmitInput { text, modifiers } => {
                self.submit_input(&text, modifiers).await.map(Outcome::Input)
            }
            Command::Primitive { primitive } => {
                self.run_primitive(primitive).await.map(|_| Outcome::Done)
            }
            Command::BeginDrag { tab_id } => {
                self.begin_drag(&tab_id);
                Ok(Outcome::Done)
            }
            Command::HoverDrag { target } => self.hover_drag(target).map(|_| Outcome::Done),
            Command::DropDrag { target } => self.drop_drag(target).await.map(Outcome::Drag),
            Command::EndDrag { pointer, window } => {
                self.end_drag(pointer, window).await.map(Outcome::Drag)
            }
            Command::RequestBounds { region } => {
                self.request_bounds(region);
                Ok(Outcome::Done)
            }
            Command::FlushBounds => self
                .flush_bounds()
                .await
                .map(|pushed| Outcome::Bounds { pushed }),
            Command::SyncBounds { region } => self
                .sync_bounds(region)
                .await
                .map(|pushed| Outcome::Bounds { pushed }),
            Command::RetryNotification { id } => self.retry_notification(&id).await.map(|_| Outcome::Done),
            Command::DismissNotification { id } => {
                self.dismiss_notification(&id).map(|_| Outcome::Done)
            }
            Command::ListNotifications => Ok(Outcome::Notifications(self.notifications.list().to_vec())),
        }
    }

    // === Tab operations ===

    pub async fn activate(&mut self, tab_id: &str) -> Result<Tab, CoordinatorError> {
        let result = self.gateway.activate_tab(tab_id).await.map_err(Into::into);
        if result.is_ok() {
            self.idle.touch(tab_id, self.clock.now());
        }
        self.finish("activate_tab", result).await
    }

    /// Closes the surface first, then asks the backend to close the tab.
    pub async fn close_tab(&mut self, tab_id: &str) -> Result<(), CoordinatorError> {
        if let Err(e) = self.surfaces.teardown(tab_id).await {
            tracing::warn!(tab_id = %tab_id, error = %e, "failed to close surface before tab close");
        }
        let result = self.gateway.close_tab(tab_id).await.map_err(Into::into);
        if result.is_ok() {
            self.idle.remove(tab_id);
            tracing::info!(tab_id = %tab_id, "tab closed");
        }
        self.finish("close_tab", result).await
    }

    pub async fn new_tab(&mut self) -> Result<Tab, CoordinatorError> {
        let url = self.settings.navigation.new_tab_url.clone();
        let result = self.gateway.create_tab(&url).await.map_err(Into::into);
        if let Ok(tab) = &result {
            self.idle.touch(&tab.id, self.clock.now());
        }
        self.finish("create_tab", result).await
    }

    /// Reopens the most recently closed tab. `Ok(None)` when nothing is left to reopen.
    pub async fn restore_last_closed(&mut self) -> Result<Option<Tab>, CoordinatorError> {
        let result = self
            .gateway
            .restore_last_closed_tab()
            .await
            .map_err(Into::into);
        if let Ok(Some(tab)) = &result {
            self.idle.touch(&tab.id, self.clock.now());
        }
        self.finish("restore_last_closed_tab", result).await
    }

    /// Manual restore from the placeholder: reactivate, then rebuild the surface at the last URL.
    pub async fn restore_discarded(&mut self, tab_id: &str) -> Result<Tab, CoordinatorError> {
        if let Err(e) = self.surfaces.teardown(tab_id).await {
            tracing::warn!(tab_id = %tab_id, error = %e, "failed to close stale surface");
        }
        let result = self.gateway.activate_tab(tab_id).await.map_err(Into::into);
        if result.is_ok() {
            self.idle.touch(tab_id, self.clock.now());
        }
        self.finish("restore_discarded", result).await
    }

    /// Activates the neighbour of the active tab, wrapping around the strip.
    pub async fn cycle(&mut self, direction: CycleDirection) -> Result<Option<Tab>, CoordinatorError> {
        let current = self
            .snapshot
            .active_id
            .as_deref()
            .and_then(|id| self.snapshot.position_of(id));
        let Some(next) = cycle_index(self.snapshot.tabs.len(), current, direction) else {
            return Ok(None);
        };
        let tab_id = self.snapshot.tabs[next].id.clone();
        self.activate(&tab_id).await.map(Some)
    }

    // === Surface primitives ===

    pub async fn run_primitive(&mut self, primitive: SurfacePrimitive) -> Result<(), CoordinatorError> {
        let tab_id = self.active_id()?;
        match self.surfaces.primitive(&tab_id, primitive).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.raise(&e, RetryAction::Primitive { tab_id, primitive });
                Err(e.into())
            }
        }
    }

    pub fn request_bounds(&mut self, region: Region) {
        self.surfaces.request_bounds(region);
    }

    pub async fn flush_bounds(&mut self) -> Result<bool, CoordinatorError> {
        self.surfaces.flush_bounds().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to push surface bounds");
            e.into()
        })
    }

    pub async fn sync_bounds(&mut self, region: Region) -> Result<bool, CoordinatorError> {
        self.surfaces.sync_bounds(region).await.map_err(|e| {
            tracing::warn!(error = %e, "failed to push surface bounds");
            e.into()
        })
    }

    // === Drag ===

    pub fn begin_drag(&mut self, tab_id: &str) {
        tracing::debug!(tab_id = %tab_id, "drag started");
        self.drag.begin(tab_id);
    }

    pub fn hover_drag(&mut self, target: Option<DropTarget>) -> Result<(), CoordinatorError> {
        self.drag.hover(target)
    }

    /// A drop target took the dragged tab: one reorder request, then a refresh.
    pub async fn drop_drag(&mut self, target: DropTarget) -> Result<DragResult, CoordinatorError> {
        let outcome = self.drag.drop_on(target, self.snapshot.tabs.len())?;
        let DragOutcome::Reorder { tab_id, new_index } = outcome.clone() else {
            return Ok(DragResult {
                outcome,
                window: None,
            });
        };
        tracing::info!(tab_id = %tab_id, new_index, "reordering tab");
        let result = self
            .gateway
            .reorder_tab(&tab_id, new_index)
            .await
            .map_err(Into::into)
            .map(|_| DragResult {
                outcome,
                window: None,
            });
        self.finish("reorder_tab", result).await
    }

    /// The gesture ended with no drop target. Outside the window the tab is detached.
    pub async fn end_drag(&mut self, pointer: Point, window: Region) -> Result<DragResult, CoordinatorError> {
        let outcome = self.drag.end(pointer, window);
        let DragOutcome::Detach { tab_id } = outcome.clone() else {
            return Ok(DragResult {
                outcome,
                window: None,
            });
        };
        if let Err(e) = self.surfaces.teardown(&tab_id).await {
            tracing::warn!(tab_id = %tab_id, error = %e, "failed to close surface before detach");
        }
        let result = self.gateway.detach_tab_to_new_window(&tab_id).await;
        let result = match result {
            Ok(info) => {
                tracing::info!(tab_id = %tab_id, window = %info.window_label, "tab detached");
                self.idle.remove(&tab_id);
                Ok(DragResult {
                    outcome,
                    window: Some(info),
                })
            }
            Err(e) => Err(e.into()),
        };
        self.finish("detach_tab_to_new_window", result).await
    }

    // === Notifications ===

    pub fn dismiss_notification(&mut self, id: &str) -> Result<Notification, CoordinatorError> {
        let notification = self.notifications.dismiss(id)?;
        self.emit(UiEvent::NotificationCleared { id: id.to_string() });
        Ok(notification)
    }

    /// Removes the notification and re-runs its action. A renewed failure raises it again.
    pub async fn retry_notification(&mut self, id: &str) -> Result<(), CoordinatorError> {
        let notification = self.dismiss_notification(id)?;
        tracing::info!(notification = %id, "retrying");
        match notification.retry {
            RetryAction::EnsureSurface { .. } => {
                let report = self.refresh().await;
                match report.failures.iter().find(|f| f.class == ErrorClass::TransientIo) {
                    Some(failure) => Err(SurfaceError::Host(failure.message.clone()).into()),
                    None => Ok(()),
                }
            }
            RetryAction::ShowSurface { tab_id } => {
                if self.snapshot.active_id.as_deref() != Some(tab_id.as_str()) {
                    return Ok(());
                }
                match self.surfaces.show(&tab_id).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        self.raise(&e, ensure_retry(&tab_id, &e));
                        Err(e.into())
                    }
                }
            }
            RetryAction::NavigateSurface { tab_id, url } => {
                match self.surfaces.navigate(&tab_id, &url).await {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        self.raise(&e, RetryAction::NavigateSurface { tab_id, url });
                        Err(e.into())
                    }
                }
            }
            RetryAction::Primitive { tab_id, primitive } => {
                match self.surfaces.primitive(&tab_id, primitive).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        self.raise(&e, RetryAction::Primitive { tab_id, primitive });
                        Err(e.into())
                    }
                }
            }
        }
    }

    // === Lifecycle ===

    /// Releases every surface. The coordinator must not be used afterwards.
    pub async fn dispose(&mut self) {
        self.drag.cancel();
        if let Err(e) = self.surfaces.teardown_all().await {
            tracing::warn!(error = %e, "surface teardown incomplete on dispose");
        }
        tracing::info!("coordinator disposed");
    }
}
