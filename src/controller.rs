//! Selection mode controller.
//!
//! Drives the page agent into or out of selection mode on user request:
//!
//! ```text
//! toggle -> TOGGLE_SELECTION_MODE
//!   agent answers          -> Sent
//!   agent missing          -> inject script + stylesheet
//!                          -> wait for the agent (200 ms, or its ready ack)
//!                          -> TOGGLE_SELECTION_MODE once more
//!                               -> SentAfterInjection | Failed(AgentUnresponsive)
//!   injection fails        -> Failed(InjectionDenied | InjectionFailed)
//! internal page            -> Failed(RestrictedPage), nothing sent
//! ```
//!
//! The controller never decides the mode itself. The agent flips its own
//! state and reports it back through status replies and mode events.

use crate::config::ResourceConfig;
use crate::constants::AGENT_SETTLE_DELAY;
use crate::error::{HostError, ToggleError};
use crate::host::{Tab, TabHost};
use crate::protocol::AgentRequest;

/// Result of one toggle request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No focused tab to act on
    NoActiveTab,
    /// Delivered to an already running agent
    Sent,
    /// Delivered after injecting the agent
    SentAfterInjection,
    /// Not delivered; the error is meant for the user
    Failed(ToggleError),
}

/// Toggle state machine for the focused tab.
#[derive(Debug, Clone)]
pub struct SelectionModeController {
    resources: ResourceConfig,
    last_error: Option<ToggleError>,
}

impl SelectionModeController {
    pub fn new(resources: ResourceConfig) -> Self {
        Self {
            resources,
            last_error: None,
        }
    }

    /// Failure of the most recent toggle, if it failed.
    pub fn last_error(&self) -> Option<&ToggleError> {
        self.last_error.as_ref()
    }

    /// Ask the focused tab's agent to flip selection mode, injecting it first
    /// if it is not running.
    pub async fn toggle<H: TabHost>(&mut self, host: &H) -> ToggleOutcome {
        let Some(tab) = host.active_tab().await else {
            log::error!("No active tab found");
            self.last_error = None;
            return ToggleOutcome::NoActiveTab;
        };

        let outcome = match self.toggle_tab(host, &tab).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("❌ Selection toggle failed on tab {}: {}", tab.id, e);
                ToggleOutcome::Failed(e)
            }
        };

        self.last_error = match &outcome {
            ToggleOutcome::Failed(e) => Some(e.clone()),
            _ => None,
        };
        outcome
    }

    async fn toggle_tab<H: TabHost>(
        &self,
        host: &H,
        tab: &Tab,
    ) -> Result<ToggleOutcome, ToggleError> {
        if tab.is_restricted() {
            log::info!("Cannot run on browser internal pages");
            return Err(ToggleError::RestrictedPage {
                url: tab.url.clone().unwrap_or_default(),
            });
        }

        match host.send(tab.id, AgentRequest::ToggleSelectionMode).await {
            Ok(_) => {
                log::debug!("Toggle sent to running agent in tab {}", tab.id);
                return Ok(ToggleOutcome::Sent);
            }
            Err(e) => {
                log::info!("💉 Page agent not running in tab {} ({}), injecting", tab.id, e);
            }
        }

        host.expect_agent(tab.id);
        self.inject(host, tab).await?;
        host.wait_for_agent(tab.id, AGENT_SETTLE_DELAY).await;

        host.send(tab.id, AgentRequest::ToggleSelectionMode)
            .await
            .map_err(ToggleError::AgentUnresponsive)?;

        log::debug!("Toggle sent after injection in tab {}", tab.id);
        Ok(ToggleOutcome::SentAfterInjection)
    }

    async fn inject<H: TabHost>(&self, host: &H, tab: &Tab) -> Result<(), ToggleError> {
        let injected = match host.inject_script(tab.id, &self.resources.agent_script).await {
            Ok(()) => {
                host.insert_css(tab.id, &self.resources.agent_stylesheet)
                    .await
            }
            Err(e) => Err(e),
        };

        injected.map_err(classify_injection_error)?;
        log::info!("✅ Page agent injected into tab {}", tab.id);
        Ok(())
    }
}

fn classify_injection_error(error: HostError) -> ToggleError {
    if error.is_permission_denied() {
        ToggleError::InjectionDenied(error)
    } else {
        ToggleError::InjectionFailed(error)
    }
}
