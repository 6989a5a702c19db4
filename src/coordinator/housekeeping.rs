//! Housekeeping Scheduler.
//!
//! Reclaims resources from tabs nobody has looked at for a while:
//! background tabs are frozen, frozen tabs are later discarded. The discard
//! clock starts at the freeze, because a successful freeze touches the tab.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::reconcile::RefreshReport;
use super::Coordinator;
use crate::managers::idle_tracker::IdleTrackerTrait;
use crate::types::errors::{CoordinatorError, ErrorClass};
use crate::types::settings::HousekeepingSettings;
use crate::types::tab::{Tab, TabId, TabState};

/// A transition housekeeping asks the backend for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "tab_id", rename_all = "snake_case")]
pub enum HousekeepingAction {
    Freeze(TabId),
    Discard(TabId),
}

impl HousekeepingAction {
    pub fn tab_id(&self) -> &str {
        match self {
            HousekeepingAction::Freeze(id) | HousekeepingAction::Discard(id) => id,
        }
    }
}

/// A requested transition the backend did not carry out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousekeepingFailure {
    pub action: HousekeepingAction,
    pub class: ErrorClass,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HousekeepingReport {
    pub planned: Vec<HousekeepingAction>,
    pub applied: Vec<HousekeepingAction>,
    pub failures: Vec<HousekeepingFailure>,
    /// The follow-up pass, run when anything was requested.
    pub refresh: Option<RefreshReport>,
}

/// Decides which tabs to freeze or discard.
///
/// The active tab and tabs without an idle stamp are never touched.
pub fn plan_housekeeping(
    tabs: &[Tab],
    active_id: Option<&str>,
    idle: &HashMap<TabId, Instant>,
    now: Instant,
    settings: &HousekeepingSettings,
) -> Vec<HousekeepingAction> {
    let freeze_after = settings.freeze_after();
    let discard_after = settings.discard_after();

    tabs.iter()
        .filter(|tab| active_id != Some(tab.id.as_str()))
        .filter_map(|tab| {
            let last = idle.get(&tab.id)?;
            let idle_for = now.saturating_duration_since(*last);
            match tab.state {
                TabState::Background if idle_for >= freeze_after => {
                    Some(HousekeepingAction::Freeze(tab.id.clone()))
                }
                TabState::Frozen if idle_for >= discard_after => {
                    Some(HousekeepingAction::Discard(tab.id.clone()))
                }
                _ => None,
            }
        })
        .collect()
}

impl Coordinator {
    /// Runs one housekeeping pass over the last known tab list.
    pub async fn run_housekeeping(&mut self) -> HousekeepingReport {
        let now = self.clock.now();
        let planned = plan_housekeeping(
            &self.snapshot.tabs,
            self.snapshot.active_id.as_deref(),
            self.idle.entries(),
            now,
            &self.settings.housekeeping,
        );
        let mut report = HousekeepingReport {
            planned: planned.clone(),
            ..HousekeepingReport::default()
        };

        for action in planned {
            let tab_id = action.tab_id().to_string();
            if let Err(e) = self.surfaces.teardown(&tab_id).await {
                tracing::warn!(tab_id = %tab_id, error = %e, "failed to close surface before reclaim");
            }

            let result = match &action {
                HousekeepingAction::Freeze(id) => self.gateway.freeze_tab(id).await,
                HousekeepingAction::Discard(id) => self.gateway.discard_tab(id).await,
            };
            match result {
                Ok(tab) => {
                    tracing::info!(tab_id = %tab_id, state = %tab.state, "housekeeping transition applied");
                    self.idle.touch(&tab_id, now);
                    report.applied.push(action);
                }
                Err(e) => {
                    let err = CoordinatorError::from(e);
                    tracing::warn!(tab_id = %tab_id, action = ?action, error = %err, "housekeeping transition failed");
                    report.failures.push(HousekeepingFailure {
                        action,
                        class: err.class(),
                        message: err.to_string(),
                    });
                }
            }
        }

        if !report.planned.is_empty() {
            report.refresh = Some(self.refresh().await);
        }
        report
    }
}
