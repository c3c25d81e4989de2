//! Tab status synchronizer.
//!
//! Keeps the panel's view of the selection mode truthful across tab switches
//! and navigations by asking the focused tab's page agent. An unreachable
//! agent is normal (not injected yet, or a page we may not script) and simply
//! reads as inactive.

use crate::host::TabHost;
use crate::model::SelectionMode;
use crate::protocol::{AgentRequest, StatusReply};

/// Best-effort mirror of the focused tab's selection mode.
#[derive(Debug, Clone, Default)]
pub struct TabStatusSynchronizer {
    mode: SelectionMode,
}

impl TabStatusSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrored mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Forget the mirrored mode after a tab switch or navigation.
    pub fn invalidate(&mut self) {
        self.mode = SelectionMode::Unknown;
    }

    /// Mirror an unsolicited mode change pushed by the agent.
    pub fn apply_event(&mut self, active: bool) -> SelectionMode {
        self.mode = SelectionMode::from_active(active);
        self.mode
    }

    /// Ask the focused tab's agent for its mode.
    ///
    /// With no focused tab nothing is sent and the mirror is left as is.
    /// Results apply in the order they resolve.
    pub async fn refresh<H: TabHost>(&mut self, host: &H) -> SelectionMode {
        let Some(tab) = host.active_tab().await else {
            log::debug!("Status check skipped: no active tab");
            return self.mode;
        };

        self.mode = match host.send(tab.id, AgentRequest::CheckStatus).await {
            Ok(Some(reply)) => match serde_json::from_value::<StatusReply>(reply) {
                Ok(status) => status.mode(),
                Err(e) => {
                    log::debug!("Unexpected status reply from tab {}: {}", tab.id, e);
                    SelectionMode::Inactive
                }
            },
            Ok(None) => SelectionMode::Inactive,
            Err(e) => {
                log::debug!("No page agent in tab {}: {}", tab.id, e);
                SelectionMode::Inactive
            }
        };

        log::debug!("🔄 Tab {} selection mode: {}", tab.id, self.mode.name());
        self.mode
    }
}
