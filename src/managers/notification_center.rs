//! Notification Center.
//!
//! Holds the non-blocking failure notices shown to the user. Each notice
//! carries the action that retries it; raising the same action twice updates
//! the existing notice instead of stacking a duplicate.

use uuid::Uuid;

use crate::types::errors::CoordinatorError;
use crate::types::notification::{Notification, RetryAction};

/// Trait defining notification bookkeeping.
pub trait NotificationCenterTrait {
    fn raise(&mut self, message: &str, retry: RetryAction) -> Notification;
    fn dismiss(&mut self, id: &str) -> Result<Notification, CoordinatorError>;
    fn list(&self) -> &[Notification];
    fn retain_tabs(&mut self, known: &[&str]) -> Vec<Notification>;
}

#[derive(Debug, Default)]
pub struct NotificationCenter {
    pending: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.pending.iter().find(|n| n.id == id)
    }
}

fn retry_tab(action: &RetryAction) -> &str {
    match action {
        RetryAction::EnsureSurface { tab_id }
        | RetryAction::NavigateSurface { tab_id, .. }
        | RetryAction::ShowSurface { tab_id }
        | RetryAction::Primitive { tab_id, .. } => tab_id,
    }
}

impl NotificationCenterTrait for NotificationCenter {
    fn raise(&mut self, message: &str, retry: RetryAction) -> Notification {
        if let Some(existing) = self.pending.iter_mut().find(|n| n.retry == retry) {
            existing.message = message.to_string();
            return existing.clone();
        }
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            retry,
        };
        self.pending.push(notification.clone());
        notification
    }

    /// Removes a notification. Retrying also goes through here before re-running the action.
    fn dismiss(&mut self, id: &str) -> Result<Notification, CoordinatorError> {
        let pos = self
            .pending
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| CoordinatorError::UnknownNotification(id.to_string()))?;
        Ok(self.pending.remove(pos))
    }

    fn list(&self) -> &[Notification] {
        &self.pending
    }

    /// Drops notices whose tab no longer exists. Returns the dropped notices.
    fn retain_tabs(&mut self, known: &[&str]) -> Vec<Notification> {
        let (keep, gone): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|n| known.contains(&retry_tab(&n.retry)));
        self.pending = keep;
        gone
    }
}
