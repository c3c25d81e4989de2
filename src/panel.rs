//! The side panel.
//!
//! Owns the image store, the status synchronizer and the selection controller
//! for as long as the panel page is open, and routes every [`Message`] to
//! them. Each message is handled to completion, including host round trips,
//! before the next one; store mutations are always followed by a re-render in
//! the same step so card indices never go stale.

use crate::config::PanelConfig;
use crate::controller::{SelectionModeController, ToggleOutcome};
use crate::error::ToggleError;
use crate::host::{ExportHost, TabHost};
use crate::message::Message;
use crate::model::SelectionMode;
use crate::protocol::AgentEvent;
use crate::render::{self, DownloadOutcome, Gallery, ModeIndicator, PanelView};
use crate::store::{AddOutcome, ImageStore, KeyValueStore};
use crate::sync::TabStatusSynchronizer;

/// Side panel state and event handling.
pub struct Panel<H, S, V> {
    host: H,
    store: ImageStore<S>,
    view: V,
    sync: TabStatusSynchronizer,
    controller: SelectionModeController,
}

impl<H, S, V> Panel<H, S, V>
where
    H: TabHost + ExportHost,
    S: KeyValueStore,
    V: PanelView,
{
    pub fn new(host: H, storage: S, view: V, config: &PanelConfig) -> Self {
        Self {
            host,
            store: ImageStore::new(storage, config.resources.storage_key.clone()),
            view,
            sync: TabStatusSynchronizer::new(),
            controller: SelectionModeController::new(config.resources.clone()),
        }
    }

    /// Handle one message.
    pub async fn update(&mut self, message: Message) {
        log::trace!("Panel message: {:?}", message);

        match message {
            Message::PanelLoaded => {
                self.store.load();
                self.render();
                self.refresh_status().await;
            }
            Message::TabActivated | Message::TabNavigated => {
                self.sync.invalidate();
                self.show_mode();
                self.refresh_status().await;
            }
            Message::Agent(event) => self.handle_agent_event(event),
            Message::ToggleSelection => self.toggle_selection().await,
            Message::ClearImages => {
                self.store.clear();
                self.render();
            }
            Message::Download(index) => self.download(index).await,
            Message::Delete(index) => {
                if self.store.remove(index) {
                    self.render();
                }
            }
        }
    }

    fn handle_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::ImageExtracted { image_data } => {
                if self.store.add(image_data) == AddOutcome::Added {
                    self.render();
                }
            }
            AgentEvent::SelectionModeStatus { active } => {
                self.sync.apply_event(active);
                self.show_mode();
            }
            AgentEvent::AgentReady => {
                log::debug!("Page agent reported ready");
            }
        }
    }

    async fn refresh_status(&mut self) {
        self.sync.refresh(&self.host).await;
        self.show_mode();
    }

    async fn toggle_selection(&mut self) {
        match self.controller.toggle(&self.host).await {
            ToggleOutcome::Failed(error) => {
                // Internal pages change nothing; any other failure leaves
                // the agent idle.
                if !matches!(error, ToggleError::RestrictedPage { .. }) {
                    self.sync.apply_event(false);
                    self.show_mode();
                }
                self.view.notify(error.user_message());
            }
            ToggleOutcome::NoActiveTab
            | ToggleOutcome::Sent
            | ToggleOutcome::SentAfterInjection => {}
        }
    }

    async fn download(&mut self, index: usize) {
        let Some(image) = self.store.get(index).cloned() else {
            log::debug!("Ignoring download of stale index {}", index);
            return;
        };

        if let DownloadOutcome::Saved(file_name) =
            render::download(&self.host, &image, render::now_utc()).await
        {
            log::debug!("Saved {} as {}", image.src, file_name);
        }
    }

    fn render(&mut self) {
        self.view.render_gallery(&Gallery::project(self.store.images()));
    }

    fn show_mode(&mut self) {
        self.view.show_mode(&ModeIndicator::for_mode(self.sync.mode()));
    }

    /// Mirrored selection mode of the focused tab.
    pub fn mode(&self) -> SelectionMode {
        self.sync.mode()
    }

    pub fn store(&self) -> &ImageStore<S> {
        &self.store
    }

    pub fn controller(&self) -> &SelectionModeController {
        &self.controller
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}
