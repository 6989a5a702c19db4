use serde::{Deserialize, Serialize};

use super::tab::{Tab, TabId};

/// Which navigation controls the toolbar should enable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavAffordances {
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub can_reload: bool,
    pub can_stop: bool,
    pub reader_available: bool,
}

impl NavAffordances {
    /// Derives control availability from the active tab.
    pub fn for_active(active: Option<&Tab>) -> Self {
        let Some(tab) = active else {
            return Self::default();
        };
        let navigable = !tab.has_blank_url() && tab.state != super::tab::TabState::Discarded;
        let web = {
            let url = tab.url.trim_start();
            url.starts_with("http://") || url.starts_with("https://")
        };
        Self {
            can_go_back: navigable,
            can_go_forward: navigable,
            can_reload: navigable,
            can_stop: navigable && tab.is_loading,
            reader_available: navigable && web,
        }
    }
}

/// Stand-in shown where a discarded tab's surface would be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub tab_id: TabId,
    pub title: String,
    pub url: String,
}

/// The view the coordinator last rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tabs: Vec<Tab>,
    pub active_id: Option<TabId>,
    pub is_empty: bool,
    pub nav: NavAffordances,
    pub placeholder: Option<Placeholder>,
}

impl Snapshot {
    pub fn active_tab(&self) -> Option<&Tab> {
        let id = self.active_id.as_deref()?;
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn position_of(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }
}
