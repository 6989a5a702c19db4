//! Remote State Gateway contract.
//!
//! The backend owns every tab record. The coordinator only reads snapshots
//! and requests transitions through this trait; each request may be refused.

pub mod input;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::errors::GatewayError;
use crate::types::navigation::{InputResolution, NewWindowInfo};
use crate::types::tab::Tab;

/// Request/response operations exposed by the tab backend.
#[async_trait]
pub trait RemoteStateGateway: Send + Sync {
    async fn get_active_tab(&self) -> Result<Option<Tab>, GatewayError>;
    async fn get_tabs(&self) -> Result<Vec<Tab>, GatewayError>;
    async fn activate_tab(&self, tab_id: &str) -> Result<Tab, GatewayError>;
    async fn create_tab(&self, url: &str) -> Result<Tab, GatewayError>;
    async fn create_tab_background(&self, url: &str) -> Result<Tab, GatewayError>;
    async fn close_tab(&self, tab_id: &str) -> Result<(), GatewayError>;
    async fn reorder_tab(&self, tab_id: &str, new_index: usize) -> Result<(), GatewayError>;
    async fn freeze_tab(&self, tab_id: &str) -> Result<Tab, GatewayError>;
    async fn discard_tab(&self, tab_id: &str) -> Result<Tab, GatewayError>;
    async fn restore_last_closed_tab(&self) -> Result<Option<Tab>, GatewayError>;
    async fn detach_tab_to_new_window(&self, tab_id: &str) -> Result<NewWindowInfo, GatewayError>;
    async fn open_url_in_new_window(&self, url: &str) -> Result<NewWindowInfo, GatewayError>;
    async fn navigate_tab(&self, tab_id: &str, url: &str) -> Result<Tab, GatewayError>;
    async fn resolve_input(&self, text: &str) -> Result<InputResolution, GatewayError>;
}

/// Structured success/error envelope used by backend command replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Unwraps the envelope for `operation`.
    ///
    /// A failed envelope becomes [`GatewayError::Rejected`]; a successful one
    /// without a payload is a malformed reply.
    pub fn into_result(self, operation: &str) -> Result<T, GatewayError> {
        if !self.success {
            let reason = self.error.unwrap_or_else(|| "unspecified".to_string());
            return Err(GatewayError::rejected(operation, reason));
        }
        self.data.ok_or_else(|| {
            GatewayError::Transport(format!("{} succeeded without a payload", operation))
        })
    }
}

impl<T> From<Result<T, GatewayError>> for CommandResult<T> {
    fn from(result: Result<T, GatewayError>) -> Self {
        match result {
            Ok(data) => CommandResult::ok(data),
            Err(e) => CommandResult::err(e.to_string()),
        }
    }
}
