//! Recording test doubles for the host runtime and the panel view.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;

use crate::error::HostError;
use crate::host::{ExportHost, Tab, TabHost, TabId};
use crate::protocol::AgentRequest;
use crate::render::{Gallery, ModeIndicator, PanelView};

/// Host interaction recorded by [`MockHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Send(TabId, AgentRequest),
    InjectScript(TabId, String),
    InsertCss(TabId, String),
    Sleep(Duration),
}

/// Host with one simulated tab and page agent.
#[derive(Debug, Default)]
pub struct MockHost {
    tab: RefCell<Option<Tab>>,
    agent_present: Cell<bool>,
    agent_selecting: Cell<bool>,
    /// Whether injecting the script brings up a working agent
    injection_starts_agent: Cell<bool>,
    /// Whether a starting agent announces itself with `AGENT_READY`
    ready_signal: Cell<bool>,
    /// Tab watched for `AGENT_READY`
    watching: Cell<Option<TabId>>,
    /// Tab whose `AGENT_READY` was observed and not yet consumed
    ready: Cell<Option<TabId>>,
    script_error: RefCell<Option<HostError>>,
    css_error: RefCell<Option<HostError>>,
    status_reply: RefCell<Option<serde_json::Value>>,
    calls: RefCell<Vec<HostCall>>,
    resources: RefCell<HashMap<String, Vec<u8>>>,
    saved: RefCell<Vec<(String, Vec<u8>)>>,
    opened: RefCell<Vec<String>>,
}

impl MockHost {
    pub fn new() -> Self {
        let host = Self::default();
        host.injection_starts_agent.set(true);
        host
    }

    /// Focus a tab showing `url`.
    pub fn with_tab(self, id: TabId, url: &str) -> Self {
        self.set_tab(Some(Tab::new(id, url)));
        self
    }

    /// Start with the agent already injected.
    pub fn with_agent(self, selecting: bool) -> Self {
        self.agent_present.set(true);
        self.agent_selecting.set(selecting);
        self
    }

    /// Agents started by injection send `AGENT_READY` during script execution.
    pub fn with_ready_signal(self) -> Self {
        self.ready_signal.set(true);
        self
    }

    pub fn set_tab(&self, tab: Option<Tab>) {
        *self.tab.borrow_mut() = tab;
    }

    /// Simulate navigation: the new document has no agent.
    pub fn unload_agent(&self) {
        self.agent_present.set(false);
        self.agent_selecting.set(false);
    }

    pub fn set_injection_starts_agent(&self, starts: bool) {
        self.injection_starts_agent.set(starts);
    }

    pub fn fail_script_injection(&self, error: HostError) {
        *self.script_error.borrow_mut() = Some(error);
    }

    pub fn fail_css_injection(&self, error: HostError) {
        *self.css_error.borrow_mut() = Some(error);
    }

    /// Answer `CHECK_STATUS` with `reply` instead of the simulated agent state.
    pub fn override_status_reply(&self, reply: serde_json::Value) {
        *self.status_reply.borrow_mut() = Some(reply);
    }

    pub fn add_resource(&self, src: &str, bytes: &[u8]) {
        self.resources
            .borrow_mut()
            .insert(src.to_string(), bytes.to_vec());
    }

    pub fn agent_selecting(&self) -> bool {
        self.agent_selecting.get()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn saved_files(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.borrow().clone()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl TabHost for MockHost {
    async fn active_tab(&self) -> Option<Tab> {
        self.tab.borrow().clone()
    }

    async fn send(
        &self,
        tab: TabId,
        request: AgentRequest,
    ) -> Result<Option<serde_json::Value>, HostError> {
        self.record(HostCall::Send(tab, request));

        if !self.agent_present.get() {
            return Err(HostError::Unreachable(
                "Could not establish connection. Receiving end does not exist.".to_string(),
            ));
        }

        match request {
            AgentRequest::CheckStatus => {
                if let Some(reply) = self.status_reply.borrow().clone() {
                    return Ok(Some(reply));
                }
                Ok(Some(json!({
                    "isLoaded": true,
                    "isSelectionMode": self.agent_selecting.get(),
                })))
            }
            AgentRequest::ToggleSelectionMode => {
                self.agent_selecting.set(!self.agent_selecting.get());
                Ok(None)
            }
        }
    }

    async fn inject_script(&self, tab: TabId, file: &str) -> Result<(), HostError> {
        self.record(HostCall::InjectScript(tab, file.to_string()));
        if let Some(error) = self.script_error.borrow().clone() {
            return Err(error);
        }
        if self.injection_starts_agent.get() {
            self.agent_present.set(true);
            // Only observed when someone was listening before the script ran
            if self.ready_signal.get() && self.watching.get() == Some(tab) {
                self.ready.set(Some(tab));
            }
        }
        Ok(())
    }

    async fn insert_css(&self, tab: TabId, file: &str) -> Result<(), HostError> {
        self.record(HostCall::InsertCss(tab, file.to_string()));
        match self.css_error.borrow().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn sleep(&self, duration: Duration) {
        self.record(HostCall::Sleep(duration));
    }

    fn expect_agent(&self, tab: TabId) {
        self.watching.set(Some(tab));
        self.ready.set(None);
    }

    async fn wait_for_agent(&self, tab: TabId, max_wait: Duration) {
        self.watching.set(None);
        if self.ready.take() == Some(tab) {
            return;
        }
        self.sleep(max_wait).await;
    }
}

impl ExportHost for MockHost {
    type Resource = Vec<u8>;

    async fn fetch(&self, src: &str) -> Result<Vec<u8>, HostError> {
        self.resources
            .borrow()
            .get(src)
            .cloned()
            .ok_or_else(|| HostError::Other("Failed to fetch".to_string()))
    }

    fn save_file(&self, file_name: &str, resource: &Vec<u8>) -> Result<(), HostError> {
        self.saved
            .borrow_mut()
            .push((file_name.to_string(), resource.clone()));
        Ok(())
    }

    fn open_in_new_tab(&self, url: &str) {
        self.opened.borrow_mut().push(url.to_string());
    }
}

/// View that records everything rendered into it.
#[derive(Debug, Default)]
pub struct MockView {
    pub galleries: Vec<Gallery>,
    pub indicators: Vec<ModeIndicator>,
    pub notices: Vec<String>,
}

impl MockView {
    pub fn last_gallery(&self) -> Option<&Gallery> {
        self.galleries.last()
    }

    pub fn last_indicator(&self) -> Option<&ModeIndicator> {
        self.indicators.last()
    }
}

impl PanelView for MockView {
    fn render_gallery(&mut self, gallery: &Gallery) {
        self.galleries.push(gallery.clone());
    }

    fn show_mode(&mut self, indicator: &ModeIndicator) {
        self.indicators.push(indicator.clone());
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
