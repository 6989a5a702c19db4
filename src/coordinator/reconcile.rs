//! Reconciler pass.
//!
//! One pass re-reads the backend, picks a fallback active tab when there is
//! none, brings surfaces in line with the result and stamps idle bookkeeping.
//! A failing step is logged and recorded; the pass always runs to the end.

use serde::{Deserialize, Serialize};

use super::{ensure_retry, Coordinator};
use crate::managers::idle_tracker::IdleTrackerTrait;
use crate::managers::notification_center::NotificationCenterTrait;
use crate::types::errors::{CoordinatorError, ErrorClass};
use crate::types::event::UiEvent;
use crate::types::snapshot::{NavAffordances, Snapshot};
use crate::types::tab::{TabId, TabState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStep {
    FetchActive,
    FetchTabs,
    FallbackActivate,
    EnsureSurface,
    Teardown,
}

/// One step that failed during a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: RefreshStep,
    pub tab_id: Option<TabId>,
    pub class: ErrorClass,
    pub message: String,
}

/// What a reconciler pass saw and did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub active_id: Option<TabId>,
    pub tab_count: usize,
    /// Tab activated because the backend reported no active tab.
    pub fallback_activated: Option<TabId>,
    pub torn_down: Vec<TabId>,
    pub failures: Vec<StepFailure>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, step: RefreshStep) -> bool {
        self.failures.iter().any(|f| f.step == step)
    }

    fn record(&mut self, step: RefreshStep, tab_id: Option<&str>, err: CoordinatorError) {
        tracing::warn!(step = ?step, tab_id = ?tab_id, error = %err, "refresh step failed");
        self.failures.push(StepFailure {
            step,
            tab_id: tab_id.map(str::to_string),
            class: err.class(),
            message: err.to_string(),
        });
    }
}

impl Coordinator {
    /// Runs one reconciler pass against the backend.
    pub async fn refresh(&mut self) -> RefreshReport {
        let mut report = RefreshReport::default();
        let previous_active = self.snapshot.active_id.clone();

        // Active tab.
        let (mut active, active_known) = match self.gateway.get_active_tab().await {
            Ok(tab) => (tab, true),
            Err(e) => {
                report.record(RefreshStep::FetchActive, None, e.into());
                (None, false)
            }
        };

        // Ordered tab list; the cached list survives a failed fetch.
        let mut tabs = match self.gateway.get_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                report.record(RefreshStep::FetchTabs, None, e.into());
                let mut cached = self.snapshot.tabs.clone();
                // A reported active tab the cache has never seen still belongs in the list.
                if let Some(fresh) = &active {
                    if !cached.iter().any(|t| t.id == fresh.id) {
                        tracing::debug!(tab_id = %fresh.id, "active tab missing from cached list, adding it");
                        cached.push(fresh.clone());
                    }
                }
                cached
            }
        };
        tabs.sort_by_key(|t| t.index);

        if !active_known {
            active = previous_active
                .as_deref()
                .and_then(|id| tabs.iter().find(|t| t.id == id))
                .cloned();
        }

        // Fallback to the first tab.
        if active.is_none() && active_known {
            if let Some(first) = tabs.first().map(|t| t.id.clone()) {
                match self.gateway.activate_tab(&first).await {
                    Ok(tab) => {
                        tracing::info!(tab_id = %first, "no active tab reported, activated first tab");
                        report.fallback_activated = Some(first);
                        active = Some(tab);
                    }
                    Err(e) => report.record(RefreshStep::FallbackActivate, Some(&first), e.into()),
                }
            }
        }

        // The active tab is the one entry in `Active`; a discarded one keeps its state for the placeholder.
        if let Some(tab) = active.as_mut() {
            if tab.state != TabState::Active && tab.state != TabState::Discarded {
                tracing::debug!(tab_id = %tab.id, state = %tab.state, "active tab reported in another state, promoting it");
                tab.state = TabState::Active;
            }
        }

        let active_id = active.as_ref().map(|t| t.id.clone());
        for tab in tabs.iter_mut() {
            if active_id.as_deref() == Some(tab.id.as_str()) {
                if let Some(fresh) = &active {
                    let index = tab.index;
                    *tab = fresh.clone();
                    tab.index = index;
                }
            } else if tab.state == TabState::Active {
                tracing::debug!(tab_id = %tab.id, "backend lists a second active tab, treating it as background");
                tab.state = TabState::Background;
            }
        }
        if previous_active != active_id {
            tracing::debug!(from = ?previous_active, to = ?active_id, "active tab changed");
        }

        // Surfaces: show the active one, release everything the policy does not keep.
        match &active {
            Some(tab) => {
                if let Err(e) = self.surfaces.ensure(tab).await {
                    let retry = ensure_retry(&tab.id, &e);
                    self.raise(&e, retry);
                    report.record(RefreshStep::EnsureSurface, Some(&tab.id), e.into());
                }
            }
            None => self.surfaces.clear_placeholder(),
        }

        let retain = self.settings.surfaces.retain_background_surfaces;
        for id in self.surfaces.bound_ids() {
            let keep = if active_id.as_deref() == Some(id.as_str()) {
                active
                    .as_ref()
                    .is_some_and(|t| t.state != TabState::Discarded)
            } else {
                retain
                    && tabs
                        .iter()
                        .any(|t| t.id == id && !t.state.releases_surface())
            };
            if keep {
                continue;
            }
            match self.surfaces.teardown(&id).await {
                Ok(true) => report.torn_down.push(id),
                Ok(false) => {}
                Err(e) => report.record(RefreshStep::Teardown, Some(&id), e.into()),
            }
        }

        // Idle bookkeeping.
        let now = self.clock.now();
        let pruned = self.idle.prune(tabs.iter().map(|t| t.id.as_str()));
        if !pruned.is_empty() {
            tracing::debug!(count = pruned.len(), "pruned idle entries for removed tabs");
        }
        self.idle.stamp_missing(tabs.iter().map(|t| t.id.as_str()), now);
        if let Some(id) = &active_id {
            self.idle.touch(id, now);
        }

        let known: Vec<&str> = tabs.iter().map(|t| t.id.as_str()).collect();
        for gone in self.notifications.retain_tabs(&known) {
            self.emit(UiEvent::NotificationCleared { id: gone.id });
        }

        let snapshot = Snapshot {
            nav: NavAffordances::for_active(active.as_ref()),
            is_empty: tabs.is_empty(),
            placeholder: self.surfaces.placeholder().cloned(),
            active_id,
            tabs,
        };
        report.active_id = snapshot.active_id.clone();
        report.tab_count = snapshot.tabs.len();
        if snapshot != self.snapshot {
            self.snapshot = snapshot.clone();
            self.emit(UiEvent::SnapshotUpdated(snapshot));
        }

        if !report.is_clean() {
            tracing::warn!(failures = report.failures.len(), "refresh finished with failures");
        }
        report
    }
}
