use serde::{Deserialize, Serialize};

/// Recovery class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    /// Surface create/show/navigate failures. Surfaced as a retryable notification.
    TransientIo,
    /// The backend disagrees with the local cache. Recovered by re-rendering.
    StateDesync,
    /// The backend declined a requested transition. Recovered by re-reading the snapshot.
    OperationRejected,
}

// === GatewayError ===

/// Errors reported by the remote tab backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Tab with the given ID is unknown to the backend.
    #[error("Tab not found: {0}")]
    NotFound(String),
    /// The backend refused the requested operation.
    #[error("Operation {operation} rejected: {reason}")]
    Rejected { operation: String, reason: String },
    /// The request could not be delivered or its reply could not be read.
    #[error("Gateway transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn rejected(operation: &str, reason: impl Into<String>) -> Self {
        GatewayError::Rejected {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

// === SurfaceError ===

/// Errors raised by the native surface host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("Failed to create surface for tab {tab_id}: {reason}")]
    CreateFailed { tab_id: String, reason: String },
    #[error("Failed to show surface for tab {tab_id}: {reason}")]
    ShowFailed { tab_id: String, reason: String },
    #[error("Navigation failed for tab {tab_id}: {reason}")]
    NavigateFailed { tab_id: String, reason: String },
    #[error("No surface bound for tab: {0}")]
    NotBound(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Any other host primitive (bounds, reload, history, stop) failed.
    #[error("Surface host error: {0}")]
    Host(String),
}

// === ConfigError ===

/// Errors related to loading and updating coordinator settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === CoordinatorError ===

/// Failures surfaced by coordinator operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("No active tab")]
    NoActiveTab,
    #[error("Unknown notification: {0}")]
    UnknownNotification(String),
    #[error("No drag in progress")]
    NoDragInProgress,
    /// The coordinator task has been disposed and no longer accepts commands.
    #[error("Coordinator stopped")]
    Stopped,
}

impl CoordinatorError {
    /// Maps a failure onto its recovery class.
    pub fn class(&self) -> ErrorClass {
        match self {
            CoordinatorError::Surface(_) => ErrorClass::TransientIo,
            CoordinatorError::Gateway(GatewayError::NotFound(_)) => ErrorClass::StateDesync,
            CoordinatorError::Gateway(GatewayError::Rejected { .. }) => {
                ErrorClass::OperationRejected
            }
            CoordinatorError::Gateway(GatewayError::Transport(_)) => ErrorClass::TransientIo,
            CoordinatorError::NoActiveTab
            | CoordinatorError::UnknownNotification(_)
            | CoordinatorError::NoDragInProgress => ErrorClass::StateDesync,
            CoordinatorError::Stopped => ErrorClass::OperationRejected,
        }
    }

    /// Whether the failure warrants a user-visible retry affordance.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::TransientIo
    }
}
