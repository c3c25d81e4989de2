//! `chrome.storage.local` backend (WASM only).
//!
//! Records are kept as structured values, so a collection is stored as an
//! array of image objects rather than a JSON string.

use std::collections::HashMap;

use js_sys::{Array, Object, Promise, Reflect, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::KeyValueStore;
use crate::error::StoreError;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn storage_local_get(keys: &JsValue) -> Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn storage_local_set(items: &JsValue) -> Promise;
}

fn storage_error(context: &str, error: &JsValue) -> StoreError {
    StoreError::Storage(format!("{}: {:?}", context, error))
}

/// Extension storage shared by all extension pages.
///
/// The extension API is asynchronous while [`KeyValueStore`] is not: values
/// are read once in [`open`](Self::open) and served from memory, and writes
/// update memory immediately and complete in the background.
#[derive(Debug, Clone, Default)]
pub struct ChromeStorage {
    cache: HashMap<String, String>,
}

impl ChromeStorage {
    /// Read `keys` from `chrome.storage.local`.
    pub async fn open(keys: &[&str]) -> Result<Self, StoreError> {
        let names = Array::new();
        for key in keys {
            names.push(&JsValue::from_str(key));
        }

        let items = JsFuture::from(storage_local_get(&names))
            .await
            .map_err(|e| storage_error("chrome.storage.local read failed", &e))?;

        let mut cache = HashMap::new();
        for key in keys {
            let value = Reflect::get(&items, &JsValue::from_str(key))
                .map_err(|e| storage_error("Failed to read stored item", &e))?;
            if value.is_undefined() || value.is_null() {
                continue;
            }
            let json = JSON::stringify(&value)
                .map_err(|e| storage_error("Stored item is not serializable", &e))?;
            cache.insert(key.to_string(), String::from(json));
        }

        log::debug!("Opened chrome.storage.local with {} stored keys", cache.len());
        Ok(Self { cache })
    }
}

impl KeyValueStore for ChromeStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let parsed = JSON::parse(value).map_err(|e| storage_error("Value is not JSON", &e))?;
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &parsed)
            .map_err(|e| storage_error("Failed to build stored item", &e))?;

        let write = storage_local_set(&items);
        self.cache.insert(key.to_string(), value.to_string());

        let key = key.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(write).await {
                log::warn!("Failed to save '{}' to chrome.storage.local: {:?}", key, e);
            }
        });
        Ok(())
    }
}
