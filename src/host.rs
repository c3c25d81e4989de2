//! Host runtime seams.
//!
//! The panel never talks to the browser directly. Tab lookup, messaging,
//! injection, timers and downloads go through the traits here, implemented by
//! the extension bindings on WASM and by recording mocks in tests.

use std::time::Duration;

use crate::constants::RESTRICTED_URL_PREFIXES;
use crate::error::HostError;
use crate::protocol::AgentRequest;

/// Host identifier of a browser tab.
pub type TabId = i32;

/// The focused tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    /// Missing when the extension lacks the `tabs` permission for it
    pub url: Option<String>,
}

impl Tab {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: Some(url.into()),
        }
    }

    /// Whether this tab shows a browser or extension internal page.
    pub fn is_restricted(&self) -> bool {
        self.url.as_deref().is_some_and(is_restricted_url)
    }
}

/// Check a URL against the internal page schemes.
pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_URL_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Tab access, agent messaging and injection.
#[allow(async_fn_in_trait)]
pub trait TabHost {
    /// The focused tab of the current window, if any.
    async fn active_tab(&self) -> Option<Tab>;

    /// Send a request to the page agent in `tab` and wait for its reply.
    ///
    /// `Ok(None)` means the agent accepted the message without replying.
    async fn send(
        &self,
        tab: TabId,
        request: AgentRequest,
    ) -> Result<Option<serde_json::Value>, HostError>;

    /// Run a packaged script file in the page context of `tab`.
    async fn inject_script(&self, tab: TabId, file: &str) -> Result<(), HostError>;

    /// Insert a packaged stylesheet into `tab`.
    async fn insert_css(&self, tab: TabId, file: &str) -> Result<(), HostError>;

    /// Suspend for `duration` without blocking the event loop.
    async fn sleep(&self, duration: Duration);

    /// Start watching `tab` for the agent's `AGENT_READY` message.
    ///
    /// Called before injection, as the agent announces itself while the
    /// script is still being executed. The default does nothing.
    fn expect_agent(&self, tab: TabId) {
        let _ = tab;
    }

    /// Wait for a freshly injected agent to initialize.
    ///
    /// The default just waits `max_wait`. Hosts that observe the agent's
    /// `AGENT_READY` message (see [`expect_agent`](Self::expect_agent))
    /// return as soon as it has arrived, possibly without waiting at all.
    async fn wait_for_agent(&self, tab: TabId, max_wait: Duration) {
        let _ = tab;
        self.sleep(max_wait).await;
    }
}

/// Resource fetching and file export.
#[allow(async_fn_in_trait)]
pub trait ExportHost {
    /// Fetched resource contents (a `Blob` in the browser).
    type Resource;

    /// Fetch the resource behind `src` (http(s) URL or data URI).
    async fn fetch(&self, src: &str) -> Result<Self::Resource, HostError>;

    /// Offer `resource` to the user as a file download named `file_name`.
    fn save_file(&self, file_name: &str, resource: &Self::Resource) -> Result<(), HostError>;

    /// Open `url` in a new viewing context.
    fn open_in_new_tab(&self, url: &str);
}
