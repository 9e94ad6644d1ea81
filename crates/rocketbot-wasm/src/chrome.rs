//! Extension APIs: runtime messaging, `storage.local`, bundled resources.

use async_trait::async_trait;
use js_sys::{Object, Promise, Reflect};
use rocketbot_core::{
    CatalogError, CatalogSource, ChannelError, ControlChannel, FlagError, Notification,
    PersistedFlag, RUNNING_FLAG_KEY,
};
use serde::Serialize;
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage, catch)]
    fn send_message(message: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL, catch)]
    fn get_url(path: &str) -> Result<String, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener, catch)]
    pub(crate) fn add_message_listener(listener: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get, catch)]
    fn storage_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set, catch)]
    fn storage_set(items: &JsValue) -> Result<Promise, JsValue>;
}

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Plain-object form of a serde value, as the extension APIs expect.
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

/// Notifications go to the popup through `chrome.runtime.sendMessage`.
#[derive(Default)]
pub struct ChromeChannel;

impl ControlChannel for ChromeChannel {
    fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let message = to_js(notification).map_err(|e| ChannelError::Serialization(e.to_string()))?;
        let promise = send_message(&message).map_err(|e| ChannelError::Send(describe(&e)))?;
        // Rejects when the popup is closed; nobody is listening then.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                debug!(error = %describe(&e), "notification not delivered");
            }
        });
        Ok(())
    }
}

/// The `isRunning` flag in `chrome.storage.local`, shared with the popup.
#[derive(Default)]
pub struct ChromeFlag;

#[async_trait(?Send)]
impl PersistedFlag for ChromeFlag {
    async fn load(&self) -> Result<bool, FlagError> {
        let key = JsValue::from_str(RUNNING_FLAG_KEY);
        let promise = storage_get(&key).map_err(|e| FlagError(describe(&e)))?;
        let items = JsFuture::from(promise)
            .await
            .map_err(|e| FlagError(describe(&e)))?;
        let value = Reflect::get(&items, &key).map_err(|e| FlagError(describe(&e)))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn store(&self, running: bool) -> Result<(), FlagError> {
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(RUNNING_FLAG_KEY), &JsValue::from_bool(running))
            .map_err(|e| FlagError(describe(&e)))?;
        let promise = storage_set(&items).map_err(|e| FlagError(describe(&e)))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| FlagError(describe(&e)))?;
        Ok(())
    }
}

/// Factor catalog shipped inside the extension package.
pub struct BundledCatalog {
    path: String,
}

impl BundledCatalog {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait(?Send)]
impl CatalogSource for BundledCatalog {
    async fn fetch(&self) -> Result<String, CatalogError> {
        let fetch_err = |e: JsValue| CatalogError::Fetch(describe(&e));

        let url = get_url(&self.path).map_err(fetch_err)?;
        let window = web_sys::window().ok_or_else(|| CatalogError::Fetch("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_str(&url))
            .await
            .map_err(fetch_err)?
            .dyn_into()
            .map_err(fetch_err)?;
        if !response.ok() {
            return Err(CatalogError::Fetch(format!("{url}: HTTP {}", response.status())));
        }

        let body = JsFuture::from(response.text().map_err(fetch_err)?)
            .await
            .map_err(fetch_err)?;
        body.as_string()
            .ok_or_else(|| CatalogError::Fetch(format!("{url}: body is not text")))
    }
}
