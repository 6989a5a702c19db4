use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::input::InputResolver;
use super::RemoteStateGateway;
use crate::types::errors::GatewayError;
use crate::types::navigation::{InputResolution, NewWindowInfo};
use crate::types::tab::{Tab, TabId, TabState};

const CLOSED_TAB_LIMIT: usize = 20;

/// Metadata kept for "reopen closed tab".
#[derive(Debug, Clone)]
struct ClosedTab {
    url: String,
    title: String,
    favicon_url: Option<String>,
    index: usize,
}

#[derive(Debug, Default)]
struct SessionState {
    tabs: Vec<Tab>,
    active_id: Option<TabId>,
    closed: Vec<ClosedTab>,
    windows: Vec<NewWindowInfo>,
}

impl SessionState {
    fn position(&self, tab_id: &str) -> Result<usize, GatewayError> {
        self.tabs
            .iter()
            .position(|t| t.id == tab_id)
            .ok_or_else(|| GatewayError::NotFound(tab_id.to_string()))
    }

    fn reindex(&mut self) {
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = i;
        }
    }

    /// Moves the current active tab to background.
    fn blur_active(&mut self) {
        if let Some(id) = self.active_id.take() {
            if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
                if tab.state == TabState::Active {
                    tab.state = TabState::Background;
                }
            }
        }
    }

    fn activate_at(&mut self, pos: usize) -> Tab {
        let target_id = self.tabs[pos].id.clone();
        if self.active_id.as_deref() != Some(target_id.as_str()) {
            self.blur_active();
        }
        let tab = &mut self.tabs[pos];
        tab.state = TabState::Active;
        self.active_id = Some(target_id);
        tab.clone()
    }

    fn push_tab(&mut self, url: &str, state: TabState) -> Tab {
        let tab = new_tab(url, state, self.tabs.len());
        self.tabs.push(tab.clone());
        tab
    }

    /// Removes a tab and hands activation to its right neighbour (or the new last tab).
    fn remove_at(&mut self, pos: usize) -> Tab {
        let removed = self.tabs.remove(pos);
        self.reindex();
        if self.active_id.as_deref() == Some(removed.id.as_str()) {
            self.active_id = None;
            if !self.tabs.is_empty() {
                let next = pos.min(self.tabs.len() - 1);
                self.activate_at(next);
            }
        }
        removed
    }

    fn open_window(&mut self, tab: Tab) -> NewWindowInfo {
        let info = NewWindowInfo {
            window_label: format!("window-{}", self.windows.len() + 1),
            session_id: Uuid::new_v4().to_string(),
            tab: Some(Tab {
                state: TabState::Active,
                index: 0,
                ..tab
            }),
        };
        self.windows.push(info.clone());
        info
    }
}

fn new_tab(url: &str, state: TabState, index: usize) -> Tab {
    Tab {
        id: Uuid::new_v4().to_string(),
        url: url.to_string(),
        title: String::new(),
        favicon_url: None,
        is_loading: false,
        state,
        index,
    }
}

/// Injected failure for one gateway operation.
#[derive(Debug, Clone)]
struct Fault {
    error: GatewayError,
    persistent: bool,
}

/// Reference backend holding one window's tab session in memory.
///
/// Transitions are validated against [`TabState::can_transition_to`], and the
/// active tab may be neither frozen nor discarded. Failures can be injected per
/// operation name (`"freeze_tab"`, `"get_tabs"`, ...).
pub struct InMemoryGateway {
    state: Mutex<SessionState>,
    resolver: InputResolver,
    faults: Mutex<HashMap<String, Fault>>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::with_resolver(InputResolver::new())
    }

    pub fn with_resolver(resolver: InputResolver) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            resolver,
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Builds a session with one tab per URL; the first becomes active.
    pub fn with_tabs(urls: &[&str]) -> Self {
        let gateway = Self::new();
        for (i, url) in urls.iter().enumerate() {
            let state = if i == 0 {
                TabState::Active
            } else {
                TabState::Background
            };
            gateway.insert_tab(url, state);
        }
        gateway
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Transport("session state lock poisoned".to_string()))
    }

    /// Lock for seeding helpers; a poisoned lock still yields the state.
    fn seed(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the call and returns any injected failure for it.
    fn enter(&self, operation: &str) -> Result<(), GatewayError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(operation.to_string());
        }
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| GatewayError::Transport("fault table lock poisoned".to_string()))?;
        match faults.get(operation) {
            Some(fault) if fault.persistent => Err(fault.error.clone()),
            Some(_) => match faults.remove(operation) {
                Some(fault) => Err(fault.error),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    // === Seeding and inspection ===

    /// Appends a tab in the given state. Inserting an active tab blurs the previous one.
    pub fn insert_tab(&self, url: &str, state: TabState) -> Tab {
        let mut s = self.seed();
        if state == TabState::Active {
            s.blur_active();
        }
        let tab = s.push_tab(url, state);
        if state == TabState::Active {
            s.active_id = Some(tab.id.clone());
        }
        tab
    }

    /// Forgets the active tab, leaving every tab in background.
    pub fn clear_active(&self) {
        self.seed().blur_active();
    }

    pub fn set_title(&self, tab_id: &str, title: &str) {
        if let Some(tab) = self.seed().tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.title = title.to_string();
        }
    }

    /// Overwrites a tab's state without any transition check, for seeding odd backend replies.
    pub fn set_state(&self, tab_id: &str, state: TabState) {
        if let Some(tab) = self.seed().tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.state = state;
        }
    }

    pub fn set_loading(&self, tab_id: &str, loading: bool) {
        if let Some(tab) = self.seed().tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.is_loading = loading;
        }
    }

    /// Fails the next call of `operation` with `error`.
    pub fn fail_next(&self, operation: &str, error: GatewayError) {
        self.set_fault(operation, error, false);
    }

    /// Fails every call of `operation` with `error` until [`Self::clear_faults`].
    pub fn fail_always(&self, operation: &str, error: GatewayError) {
        self.set_fault(operation, error, true);
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    fn set_fault(&self, operation: &str, error: GatewayError, persistent: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(operation.to_string(), Fault { error, persistent });
        }
    }

    /// Operation names received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == operation).count()
    }

    /// Windows opened by detach or new-window requests.
    pub fn windows(&self) -> Vec<NewWindowInfo> {
        self.seed().windows.clone()
    }

    pub fn closed_count(&self) -> usize {
        self.seed().closed.len()
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStateGateway for InMemoryGateway {
    async fn get_active_tab(&self) -> Result<Option<Tab>, GatewayError> {
        self.enter("get_active_tab")?;
        let s = self.lock()?;
        Ok(s
            .active_id
            .as_deref()
            .and_then(|id| s.tabs.iter().find(|t| t.id == id))
            .cloned())
    }

    async fn get_tabs(&self) -> Result<Vec<Tab>, GatewayError> {
        self.enter("get_tabs")?;
        Ok(self.lock()?.tabs.clone())
    }

    async fn activate_tab(&self, tab_id: &str) -> Result<Tab, GatewayError> {
        self.enter("activate_tab")?;
        let mut s = self.lock()?;
        let pos = s.position(tab_id)?;
        Ok(s.activate_at(pos))
    }

    async fn create_tab(&self, url: &str) -> Result<Tab, GatewayError> {
        self.enter("create_tab")?;
        let mut s = self.lock()?;
        s.blur_active();
        let tab = s.push_tab(url, TabState::Active);
        s.active_id = Some(tab.id.clone());
        Ok(tab)
    }

    async fn create_tab_background(&self, url: &str) -> Result<Tab, GatewayError> {
        self.enter("create_tab_background")?;
        let mut s = self.lock()?;
        if s.active_id.is_none() {
            let tab = s.push_tab(url, TabState::Active);
            s.active_id = Some(tab.id.clone());
            return Ok(tab);
        }
        Ok(s.push_tab(url, TabState::Background))
    }

    async fn close_tab(&self, tab_id: &str) -> Result<(), GatewayError> {
        self.enter("close_tab")?;
        let mut s = self.lock()?;
        let pos = s.position(tab_id)?;
        let removed = s.remove_at(pos);
        s.closed.push(ClosedTab {
            url: removed.url,
            title: removed.title,
            favicon_url: removed.favicon_url,
            index: pos,
        });
        if s.closed.len() > CLOSED_TAB_LIMIT {
            let overflow = s.closed.len() - CLOSED_TAB_LIMIT;
            s.closed.drain(0..overflow);
        }
        tracing::debug!(tab_id = %tab_id, "backend closed tab");
        Ok(())
    }

    async fn reorder_tab(&self, tab_id: &str, new_index: usize) -> Result<(), GatewayError> {
        self.enter("reorder_tab")?;
        let mut s = self.lock()?;
        let pos = s.position(tab_id)?;
        let tab = s.tabs.remove(pos);
        let target = new_index.min(s.tabs.len());
        s.tabs.insert(target, tab);
        s.reindex();
        Ok(())
    }

    async fn freeze_tab(&self, tab_id: &str) -> Result<Tab, GatewayError> {
        self.enter("freeze_tab")?;
        let mut s = self.lock()?;
        let pos = s.position(tab_id)?;
        if s.active_id.as_deref() == Some(tab_id) {
            return Err(GatewayError::rejected("freeze_tab", "tab is active"));
        }
        let tab = &mut s.tabs[pos];
        if !tab.state.can_transition_to(TabState::Frozen) {
            return Err(GatewayError::rejected(
                "freeze_tab",
                format!("cannot freeze a {} tab", tab.state),
            ));
        }
        tab.state = TabState::Frozen;
        Ok(tab.clone())
    }

    async fn discard_tab(&self, tab_id: &str) -> Result<Tab, GatewayError> {
        self.enter("discard_tab")?;
        let mut s = self.lock()?;
        let pos = s.position(tab_id)?;
        if s.active_id.as_deref() == Some(tab_id) {
            return Err(GatewayError::rejected("discard_tab", "tab is active"));
        }
        let tab = &mut s.tabs[pos];
        if !tab.state.can_transition_to(TabState::Discarded) {
            return Err(GatewayError::rejected(
                "discard_tab",
                format!("cannot discard a {} tab", tab.state),
            ));
        }
        tab.state = TabState::Discarded;
        tab.is_loading = false;
        Ok(tab.clone())
    }

    async fn restore_last_closed_tab(&self) -> Result<Option<Tab>, GatewayError> {
        self.enter("restore_last_closed_tab")?;
        let mut s = self.lock()?;
        let Some(closed) = s.closed.pop() else {
            return Ok(None);
        };
        s.blur_active();
        let target = closed.index.min(s.tabs.len());
        let mut tab = new_tab(&closed.url, TabState::Active, target);
        tab.title = closed.title;
        tab.favicon_url = closed.favicon_url;
        s.tabs.insert(target, tab.clone());
        s.reindex();
        s.active_id = Some(tab.id.clone());
        Ok(Some(tab))
    }

    async fn detach_tab_to_new_window(&self, tab_id: &str) -> Result<NewWindowInfo, GatewayError> {
        self.enter("detach_tab_to_new_window")?;
        let mut s = self.lock()?;
        let pos = s.position(tab_id)?;
        let removed = s.remove_at(pos);
        Ok(s.open_window(removed))
    }

    async fn open_url_in_new_window(&self, url: &str) -> Result<NewWindowInfo, GatewayError> {
        self.enter("open_url_in_new_window")?;
        let mut s = self.lock()?;
        Ok(s.open_window(new_tab(url, TabState::Active, 0)))
    }

    async fn navigate_tab(&self, tab_id: &str, url: &str) -> Result<Tab, GatewayError> {
        self.enter("navigate_tab")?;
        let mut s = self.lock()?;
        let pos = s.position(tab_id)?;
        let tab = &mut s.tabs[pos];
        if tab.url != url {
            tab.url = url.to_string();
            tab.title.clear();
            tab.favicon_url = None;
        }
        Ok(tab.clone())
    }

    async fn resolve_input(&self, text: &str) -> Result<InputResolution, GatewayError> {
        self.enter("resolve_input")?;
        Ok(self.resolver.resolve(text))
    }
}
