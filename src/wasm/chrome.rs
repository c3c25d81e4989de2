//! Extension host implemented on the `chrome.*` APIs.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, HtmlAnchorElement, Response, Url};

use crate::error::HostError;
use crate::host::{ExportHost, Tab, TabHost, TabId};
use crate::protocol::AgentRequest;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = query)]
    fn tabs_query(query: &JsValue) -> Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    fn tabs_send_message(tab_id: i32, message: &JsValue) -> Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "scripting"], js_name = executeScript)]
    fn scripting_execute_script(injection: &JsValue) -> Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "scripting"], js_name = insertCSS)]
    fn scripting_insert_css(injection: &JsValue) -> Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs", "onActivated"], js_name = addListener)]
    pub(crate) fn on_tab_activated(callback: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "tabs", "onUpdated"], js_name = addListener)]
    pub(crate) fn on_tab_updated(callback: &Closure<dyn FnMut(JsValue, JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    pub(crate) fn on_runtime_message(callback: &Closure<dyn FnMut(JsValue, JsValue, JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = removeListener)]
    fn off_runtime_message(callback: &Closure<dyn FnMut(JsValue, JsValue, JsValue)>);
}

/// Convert a serde value to a plain JS object.
pub(crate) fn to_js(value: &serde_json::Value) -> JsValue {
    js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::UNDEFINED)
}

/// Convert a JS value to a serde value. `undefined` and functions give `None`.
pub(crate) fn from_js(value: &JsValue) -> Option<serde_json::Value> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let json: String = js_sys::JSON::stringify(value).ok()?.into();
    serde_json::from_str(&json).ok()
}

/// Message text of a rejected promise.
fn js_error_message(error: &JsValue) -> String {
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

async fn await_promise(promise: Promise) -> Result<JsValue, HostError> {
    JsFuture::from(promise)
        .await
        .map_err(|e| HostError::classify(js_error_message(&e)))
}

fn injection_target(tab: TabId, file: &str) -> JsValue {
    to_js(&serde_json::json!({
        "target": { "tabId": tab },
        "files": [file],
    }))
}

fn window() -> Result<web_sys::Window, HostError> {
    web_sys::window().ok_or_else(|| HostError::Other("No window object available".to_string()))
}

type RuntimeListener = Closure<dyn FnMut(JsValue, JsValue, JsValue)>;

/// `AGENT_READY` watch on one tab, armed before injection.
#[derive(Debug)]
struct ReadyWatch {
    tab: TabId,
    /// Set once the agent of `tab` announced itself
    ready: bool,
    /// Resolves the pending wait, if one is running
    resolve: Option<Function>,
    listener: RuntimeListener,
}

type SharedWatch = Rc<RefCell<Option<ReadyWatch>>>;

/// Host backed by the extension APIs of the side panel page.
#[derive(Debug, Clone, Default)]
pub struct ChromeHost {
    /// Wait for `AGENT_READY` after injection instead of the bare delay
    ready_handshake: bool,
    watch: SharedWatch,
}

impl ChromeHost {
    pub fn new(ready_handshake: bool) -> Self {
        Self {
            ready_handshake,
            watch: Rc::default(),
        }
    }

    /// Drop the current watch and its runtime listener.
    fn disarm(&self) {
        let previous = self.watch.borrow_mut().take();
        if let Some(watch) = previous {
            off_runtime_message(&watch.listener);
        }
    }
}

impl TabHost for ChromeHost {
    async fn active_tab(&self) -> Option<Tab> {
        let query = to_js(&serde_json::json!({"active": true, "currentWindow": true}));
        let tabs = match await_promise(tabs_query(&query)).await {
            Ok(tabs) => tabs,
            Err(e) => {
                log::warn!("Tab query failed: {}", e);
                return None;
            }
        };

        let first = js_sys::Array::from(&tabs).get(0);
        let tab = from_js(&first)?;
        let id = tab.get("id")?.as_i64()?;
        Some(Tab {
            id: i32::try_from(id).ok()?,
            url: tab.get("url").and_then(|url| url.as_str()).map(str::to_string),
        })
    }

    async fn send(
        &self,
        tab: TabId,
        request: AgentRequest,
    ) -> Result<Option<serde_json::Value>, HostError> {
        let message = serde_json::to_value(request)
            .map_err(|e| HostError::Other(format!("Failed to encode request: {}", e)))?;
        log::debug!("📨 {} -> tab {}", request.tag(), tab);

        let reply = await_promise(tabs_send_message(tab, &to_js(&message))).await?;
        Ok(from_js(&reply))
    }

    async fn inject_script(&self, tab: TabId, file: &str) -> Result<(), HostError> {
        await_promise(scripting_execute_script(&injection_target(tab, file))).await?;
        Ok(())
    }

    async fn insert_css(&self, tab: TabId, file: &str) -> Result<(), HostError> {
        await_promise(scripting_insert_css(&injection_target(tab, file))).await?;
        Ok(())
    }

    async fn sleep(&self, duration: Duration) {
        let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    fn expect_agent(&self, tab: TabId) {
        if !self.ready_handshake {
            return;
        }
        self.disarm();

        let weak = Rc::downgrade(&self.watch);
        let listener = RuntimeListener::new(
            move |message: JsValue, sender: JsValue, _respond: JsValue| {
                if !is_ready_from(&message, &sender, tab) {
                    return;
                }
                let Some(watch) = weak.upgrade() else {
                    return;
                };
                let resolve = match watch.borrow_mut().as_mut() {
                    Some(watch) if watch.tab == tab => {
                        watch.ready = true;
                        watch.resolve.take()
                    }
                    _ => None,
                };
                if let Some(resolve) = resolve {
                    let _ = resolve.call0(&JsValue::NULL);
                }
            },
        );

        on_runtime_message(&listener);
        *self.watch.borrow_mut() = Some(ReadyWatch {
            tab,
            ready: false,
            resolve: None,
            listener,
        });
    }

    async fn wait_for_agent(&self, tab: TabId, max_wait: Duration) {
        let armed = self
            .watch
            .borrow()
            .as_ref()
            .map(|watch| (watch.tab == tab, watch.ready));

        match armed {
            Some((true, true)) => {
                log::debug!("Agent in tab {} already reported ready", tab);
                self.disarm();
                return;
            }
            Some((true, false)) => {}
            _ => {
                self.sleep(max_wait).await;
                return;
            }
        }

        let millis = i32::try_from(max_wait.as_millis()).unwrap_or(i32::MAX);
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
            }
            if let Some(watch) = self.watch.borrow_mut().as_mut() {
                watch.resolve = Some(resolve);
            }
        });

        let _ = JsFuture::from(promise).await;
        self.disarm();
        log::debug!("Agent wait for tab {} finished", tab);
    }
}

fn is_ready_from(message: &JsValue, sender: &JsValue, tab: TabId) -> bool {
    let is_ready = from_js(message)
        .and_then(|message| message.get("type")?.as_str().map(|t| t == "AGENT_READY"))
        .unwrap_or(false);
    let sender_tab = from_js(sender)
        .and_then(|sender| sender.get("tab")?.get("id")?.as_i64());
    is_ready && sender_tab == Some(i64::from(tab))
}

impl ExportHost for ChromeHost {
    type Resource = Blob;

    async fn fetch(&self, src: &str) -> Result<Blob, HostError> {
        let response: Response = await_promise(window()?.fetch_with_str(src))
            .await?
            .dyn_into()
            .map_err(|_| HostError::Other("fetch did not return a Response".to_string()))?;

        if !response.ok() {
            return Err(HostError::Other(format!(
                "HTTP {} for {}",
                response.status(),
                src
            )));
        }

        let blob_promise = response
            .blob()
            .map_err(|e| HostError::Other(js_error_message(&e)))?;
        await_promise(blob_promise)
            .await?
            .dyn_into()
            .map_err(|_| HostError::Other("Response body is not a Blob".to_string()))
    }

    fn save_file(&self, file_name: &str, resource: &Blob) -> Result<(), HostError> {
        let js_err = |e: JsValue| HostError::Other(js_error_message(&e));

        let document = window()?
            .document()
            .ok_or_else(|| HostError::Other("No document available".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| HostError::Other("No document body".to_string()))?;

        let url = Url::create_object_url_with_blob(resource).map_err(js_err)?;
        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| HostError::Other("Not an anchor element".to_string()))?;

        anchor.set_href(&url);
        anchor.set_download(file_name);
        anchor.style().set_property("display", "none").map_err(js_err)?;
        body.append_child(&anchor).map_err(js_err)?;
        anchor.click();
        anchor.remove();
        Url::revoke_object_url(&url).map_err(js_err)?;
        Ok(())
    }

    fn open_in_new_tab(&self, url: &str) {
        if let Ok(window) = window() {
            if let Err(e) = window.open_with_url_and_target(url, "_blank") {
                log::warn!("Failed to open {}: {}", url, js_error_message(&e));
            }
        }
    }
}
