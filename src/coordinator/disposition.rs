//! Disposition Resolver.
//!
//! Decides where a requested navigation lands and carries it out.

use serde::{Deserialize, Serialize};

use super::Coordinator;
use crate::managers::idle_tracker::IdleTrackerTrait;
use crate::managers::surface_manager::NavigateMode;
use crate::types::errors::{CoordinatorError, GatewayError};
use crate::types::navigation::{CommandKind, Disposition, InputResolution, Modifiers, NewWindowInfo};
use crate::types::notification::RetryAction;
use crate::types::tab::{Tab, TabId};

/// Maps held modifiers to an open target.
///
/// Precedence: shift opens a window, alt a foreground tab, accelerator or
/// middle click a background tab; no modifier stays in the current tab.
pub fn resolve_disposition(modifiers: Modifiers) -> Disposition {
    if modifiers.shift {
        Disposition::NewWindow
    } else if modifiers.alt {
        Disposition::NewForegroundTab
    } else if modifiers.accel || modifiers.middle_click {
        Disposition::NewBackgroundTab
    } else {
        Disposition::CurrentTab
    }
}

/// Where an opened URL ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOutcome {
    pub disposition: Disposition,
    pub tab: Option<Tab>,
    pub window: Option<NewWindowInfo>,
    /// How the active surface took a current-tab navigation.
    pub surface: Option<NavigateMode>,
}

/// Result of submitting address-bar text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputOutcome {
    Opened(OpenOutcome),
    /// `@tabs`, `@history` or `@sessions`: handled by the UI's command mode.
    Command {
        kind: CommandKind,
        query: Option<String>,
    },
}

impl Coordinator {
    /// Opens `url` at the target picked from `modifiers`, then refreshes.
    pub async fn open_url(
        &mut self,
        url: &str,
        modifiers: Modifiers,
    ) -> Result<OpenOutcome, CoordinatorError> {
        let disposition = resolve_disposition(modifiers);
        tracing::info!(url = %url, disposition = ?disposition, "opening url");
        let result = self.open_with(url, disposition).await;
        self.finish("open_url", result).await
    }

    async fn open_with(
        &mut self,
        url: &str,
        disposition: Disposition,
    ) -> Result<OpenOutcome, CoordinatorError> {
        let mut outcome = OpenOutcome {
            disposition,
            tab: None,
            window: None,
            surface: None,
        };
        match disposition {
            Disposition::CurrentTab => {
                let target = match self.snapshot.active_id.clone() {
                    Some(cached) => self.reassert_active(cached).await?,
                    None => None,
                };
                let Some(previous) = target else {
                    // Nothing to navigate in place; an empty window gets a new tab.
                    let tab = self.gateway.create_tab(url).await?;
                    self.idle.touch(&tab.id, self.clock.now());
                    outcome.tab = Some(tab);
                    return Ok(outcome);
                };
                let tab = self.gateway.navigate_tab(&previous, url).await?;
                self.idle.touch(&previous, self.clock.now());
                match self.surfaces.navigate(&previous, url).await {
                    Ok(mode) => outcome.surface = Some(mode),
                    Err(e) => self.raise(
                        &e,
                        RetryAction::NavigateSurface {
                            tab_id: previous.clone(),
                            url: url.to_string(),
                        },
                    ),
                }
                outcome.tab = Some(tab);
            }
            Disposition::NewForegroundTab => {
                let tab = self.gateway.create_tab(url).await?;
                self.idle.touch(&tab.id, self.clock.now());
                outcome.tab = Some(tab);
            }
            Disposition::NewBackgroundTab => {
                let tab = self.gateway.create_tab_background(url).await?;
                self.idle.touch(&tab.id, self.clock.now());
                outcome.tab = Some(tab);
            }
            Disposition::NewWindow => {
                let info = self.gateway.open_url_in_new_window(url).await?;
                tracing::info!(window = %info.window_label, "opened url in new window");
                outcome.window = Some(info);
            }
        }
        Ok(outcome)
    }

    /// Re-activates the cached active tab. When the backend no longer knows
    /// it, re-reads the backend and returns whatever tab is active now.
    async fn reassert_active(&mut self, cached: TabId) -> Result<Option<TabId>, CoordinatorError> {
        match self.gateway.activate_tab(&cached).await {
            Ok(_) => Ok(Some(cached)),
            Err(GatewayError::NotFound(_)) => {
                tracing::info!(tab_id = %cached, "cached active tab is gone, re-reading backend");
                self.refresh().await;
                Ok(self.snapshot.active_id.clone())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves address-bar text through the backend and opens the result.
    pub async fn submit_input(
        &mut self,
        text: &str,
        modifiers: Modifiers,
    ) -> Result<InputOutcome, CoordinatorError> {
        match self.gateway.resolve_input(text).await? {
            InputResolution::Navigate(url) | InputResolution::Search(url) => {
                self.open_url(&url, modifiers).await.map(InputOutcome::Opened)
            }
            InputResolution::Command {
                command_type,
                query,
            } => Ok(InputOutcome::Command {
                kind: command_type,
                query,
            }),
        }
    }
}
