use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque backend-assigned tab identifier.
pub type TabId = String;

/// Lifecycle state of a tab as reported by the backend.
///
/// ```text
/// Active ──blur──▶ Background ──idle──▶ Frozen ──idle──▶ Discarded
///   ▲                  │                  │                  │
///   └──────────────────┴──────────────────┴──────restore─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabState {
    /// Currently displayed.
    Active,
    /// Loaded but not displayed.
    Background,
    /// Resource-reduced after an idle period.
    Frozen,
    /// Unloaded; only metadata remains.
    Discarded,
}

impl TabState {
    /// Whether the backend state machine permits moving from `self` to `target`.
    pub fn can_transition_to(&self, target: TabState) -> bool {
        match (self, target) {
            (a, b) if *a == b => true,
            (TabState::Active, TabState::Background) => true,
            (TabState::Background, TabState::Active) => true,
            (TabState::Background, TabState::Frozen) => true,
            (TabState::Frozen, TabState::Active) => true,
            (TabState::Frozen, TabState::Discarded) => true,
            (TabState::Discarded, TabState::Active) => true,
            _ => false,
        }
    }

    /// Frozen and discarded tabs must not hold a rendering surface.
    pub fn releases_surface(&self) -> bool {
        matches!(self, TabState::Frozen | TabState::Discarded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabState::Active => "active",
            TabState::Background => "background",
            TabState::Frozen => "frozen",
            TabState::Discarded => "discarded",
        }
    }
}

impl fmt::Display for TabState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(TabState::Active),
            "background" => Ok(TabState::Background),
            "frozen" => Ok(TabState::Frozen),
            "discarded" => Ok(TabState::Discarded),
            _ => Err(format!("unknown tab state: {}", s)),
        }
    }
}

/// Read-mostly local snapshot of a backend tab record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub favicon_url: Option<String>,
    pub is_loading: bool,
    pub state: TabState,
    pub index: usize,
}

impl Tab {
    /// Title for display, falling back to the URL while the page has none.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    /// A blank tab has nothing worth navigating back, forward, or reloading.
    pub fn has_blank_url(&self) -> bool {
        let url = self.url.trim();
        url.is_empty() || url == "about:blank"
    }
}
