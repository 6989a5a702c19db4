use serde::{Deserialize, Serialize};

/// Input modifiers held when a navigation was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    /// Ctrl on Linux/Windows, Cmd on macOS.
    #[serde(default)]
    pub accel: bool,
    #[serde(default)]
    pub middle_click: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::default()
        }
    }

    pub fn accel() -> Self {
        Self {
            accel: true,
            ..Self::default()
        }
    }

    pub fn middle_click() -> Self {
        Self {
            middle_click: true,
            ..Self::default()
        }
    }
}

/// Where a requested navigation lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    CurrentTab,
    NewForegroundTab,
    NewBackgroundTab,
    NewWindow,
}

/// Direction for keyboard tab cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleDirection {
    Forward,
    Backward,
}

/// Internal command-mode targets typed into the address bar as `@name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Tabs,
    History,
    Sessions,
}

/// How the backend interpreted address-bar text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum InputResolution {
    Navigate(String),
    Search(String),
    Command {
        command_type: CommandKind,
        query: Option<String>,
    },
}

/// Result of a new-window request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWindowInfo {
    pub window_label: String,
    pub session_id: String,
    pub tab: Option<super::tab::Tab>,
}
