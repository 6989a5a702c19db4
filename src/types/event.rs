use serde::{Deserialize, Serialize};

use super::notification::Notification;
use super::snapshot::Snapshot;

/// Published to the UI after the coordinator changes something visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum UiEvent {
    SnapshotUpdated(Snapshot),
    NotificationRaised(Notification),
    NotificationCleared { id: String },
}
