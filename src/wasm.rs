//! WASM entry point for the side panel page.
//!
//! Host events and button clicks are queued and handled by a single local
//! task, one message at a time, so a toggle waiting on the page agent never
//! interleaves with a store mutation.

mod chrome;
mod dom;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::PanelConfig;
use crate::message::Message;
use crate::panel::Panel;
use crate::protocol::AgentEvent;
use crate::store::ChromeStorage;

pub use chrome::ChromeHost;
pub use dom::DomView;

type SidePanel = Panel<ChromeHost, ChromeStorage, DomView>;

/// Serializes message handling for the panel.
struct EventQueue {
    pending: RefCell<VecDeque<Message>>,
    draining: Cell<bool>,
    panel: RefCell<Option<SidePanel>>,
}

impl EventQueue {
    fn dispatch(self: &Rc<Self>, message: Message) {
        self.pending.borrow_mut().push_back(message);
        self.kick();
    }

    /// Hand over the panel once its storage is open. Messages raised in the
    /// meantime are handled after `PanelLoaded`.
    fn install(self: &Rc<Self>, panel: SidePanel) {
        *self.panel.borrow_mut() = Some(panel);
        self.pending.borrow_mut().push_front(Message::PanelLoaded);
        self.kick();
    }

    fn kick(self: &Rc<Self>) {
        if self.draining.replace(true) {
            return;
        }

        let queue = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            queue.drain().await;
        });
    }

    async fn drain(&self) {
        // The panel is taken out while a message is in flight so nothing
        // else can reach it across an await.
        let Some(mut panel) = self.panel.borrow_mut().take() else {
            self.draining.set(false);
            return;
        };

        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(message) = next else {
                break;
            };
            panel.update(message).await;
        }

        *self.panel.borrow_mut() = Some(panel);
        self.draining.set(false);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = PanelConfig::load_or_default();
    crate::logging::init(config.preferences.log_level);
    log::info!("peacnut side panel starting...");

    if let Err(e) = run_panel(config) {
        log::error!("Side panel failed to start: {:?}", e);
    }
}

fn run_panel(config: PanelConfig) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let queue = Rc::new(EventQueue {
        pending: RefCell::new(VecDeque::new()),
        draining: Cell::new(false),
        panel: RefCell::new(None),
    });

    let weak: Weak<EventQueue> = Rc::downgrade(&queue);
    let dispatch: dom::Dispatch = Rc::new(move |message| {
        if let Some(queue) = weak.upgrade() {
            queue.dispatch(message);
        }
    });

    bind_button(&document, "selectMode", Message::ToggleSelection, &dispatch)?;
    bind_button(&document, "clearImages", Message::ClearImages, &dispatch)?;
    bind_host_events(&dispatch);

    let view = DomView::new(document, dispatch);
    let host = ChromeHost::new(config.preferences.ready_handshake);
    wasm_bindgen_futures::spawn_local(async move {
        let storage_key = config.resources.storage_key.clone();
        let storage = match ChromeStorage::open(&[storage_key.as_str()]).await {
            Ok(storage) => storage,
            Err(e) => {
                log::error!("Extension storage unavailable, starting with an empty history: {}", e);
                ChromeStorage::default()
            }
        };
        queue.install(Panel::new(host, storage, view, &config));

        // The queue lives as long as the panel page
        std::mem::forget(queue);
    });
    Ok(())
}

fn bind_button(
    document: &web_sys::Document,
    id: &str,
    message: Message,
    dispatch: &dom::Dispatch,
) -> Result<(), JsValue> {
    let Some(button) = document.get_element_by_id(id) else {
        log::warn!("Button #{} missing", id);
        return Ok(());
    };

    let dispatch = dispatch.clone();
    let onclick = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event| {
        dispatch(message.clone());
    });
    button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget(); // Leak the closure to keep it alive
    Ok(())
}

fn bind_host_events(dispatch: &dom::Dispatch) {
    let on_activated = {
        let dispatch = dispatch.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |_info| dispatch(Message::TabActivated))
    };
    chrome::on_tab_activated(&on_activated);
    on_activated.forget();

    let on_updated = {
        let dispatch = dispatch.clone();
        Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_tab_id, change: JsValue| {
            let complete = chrome::from_js(&change)
                .and_then(|change| change.get("status")?.as_str().map(|s| s == "complete"))
                .unwrap_or(false);
            if complete {
                dispatch(Message::TabNavigated);
            }
        })
    };
    chrome::on_tab_updated(&on_updated);
    on_updated.forget();

    let on_message = {
        let dispatch = dispatch.clone();
        Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(
            move |message: JsValue, _sender: JsValue, _respond: JsValue| {
                if let Some(event) = chrome::from_js(&message).and_then(AgentEvent::parse) {
                    dispatch(Message::Agent(event));
                }
            },
        )
    };
    chrome::on_runtime_message(&on_message);
    on_message.forget();
}
