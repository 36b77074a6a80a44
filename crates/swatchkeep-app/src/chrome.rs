//! Bindings to the extension APIs and the storage backend built on them.

use serde_json::Value;
use swatchkeep_core::Message;
use swatchkeep_core::storage::{BoxFuture, Items, Storage, StorageError, StorageResult};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    async fn storage_local_get(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    async fn storage_local_set(items: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    async fn runtime_send_message(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn on_message_add_listener(callback: &js_sys::Function);

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    async fn tabs_query(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    async fn tabs_send_message(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "scripting"], js_name = executeScript)]
    async fn scripting_execute_script(injection: JsValue) -> Result<JsValue, JsValue>;
}

/// Page script that loads the picker, relative to the extension root.
pub const CONTENT_SCRIPT: &str = "content.js";

/// Convert JSON into a JS value.
pub fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    js_sys::JSON::parse(&value.to_string())
}

/// Convert a JS value into JSON. `undefined` and functions give `None`.
pub fn from_js(value: &JsValue) -> Option<Value> {
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

/// Render a JS error for logs.
pub fn describe(error: &JsValue) -> String {
    error
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}

fn message_to_js(message: &Message) -> Result<JsValue, JsValue> {
    let json = message.to_json().map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

/// Send a message to the other extension contexts.
pub async fn send_message(message: &Message) -> Result<(), String> {
    let value = message_to_js(message).map_err(|e| describe(&e))?;
    runtime_send_message(value).await.map(|_| ()).map_err(|e| describe(&e))
}

/// Send a message to the page in `tab`.
pub async fn send_to_tab(tab: i32, message: &Message) -> Result<(), String> {
    let value = message_to_js(message).map_err(|e| describe(&e))?;
    tabs_send_message(tab, value).await.map(|_| ()).map_err(|e| describe(&e))
}

/// Id of the active tab in the current window.
pub async fn active_tab() -> Option<i32> {
    let query = to_js(&serde_json::json!({ "active": true, "currentWindow": true })).ok()?;
    let tabs = match tabs_query(query).await {
        Ok(tabs) => tabs,
        Err(e) => {
            log::error!("Tab query failed: {}", describe(&e));
            return None;
        }
    };
    let tabs = from_js(&tabs)?;
    let id = tabs.get(0)?.get("id")?.as_i64()?;
    i32::try_from(id).ok()
}

/// Inject the picker script into `tab`.
pub async fn inject_content_script(tab: i32) -> Result<(), String> {
    let injection = serde_json::json!({
        "target": { "tabId": tab },
        "files": [CONTENT_SCRIPT]
    });
    let injection = to_js(&injection).map_err(|e| describe(&e))?;
    scripting_execute_script(injection)
        .await
        .map(|_| ())
        .map_err(|e| describe(&e))
}

/// Decode a runtime message, `None` if it isn't one of ours.
pub fn decode_message(value: &JsValue) -> Option<Message> {
    from_js(value).and_then(Message::from_value)
}

/// Call `handler` for every message of ours delivered to this context.
pub fn on_message(mut handler: impl FnMut(Message) + 'static) {
    let callback = Closure::wrap(Box::new(move |message: JsValue, _sender: JsValue, _respond: JsValue| {
        if let Some(message) = decode_message(&message) {
            handler(message);
        }
    }) as Box<dyn FnMut(JsValue, JsValue, JsValue)>);

    on_message_add_listener(callback.as_ref().unchecked_ref());
    callback.forget();
}

/// Storage backed by `chrome.storage.local`.
#[derive(Debug, Default)]
pub struct ChromeStorage;

fn storage_error(error: JsValue) -> StorageError {
    StorageError::Other(describe(&error))
}

impl Storage for ChromeStorage {
    fn get(&self, keys: &[&str]) -> BoxFuture<'_, StorageResult<Items>> {
        let keys = serde_json::json!(keys);
        Box::pin(async move {
            let keys = to_js(&keys).map_err(storage_error)?;
            let result = storage_local_get(keys).await.map_err(storage_error)?;
            match from_js(&result) {
                Some(Value::Object(items)) => Ok(items),
                _ => Ok(Items::new()),
            }
        })
    }

    fn set(&self, items: Items) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let items = to_js(&Value::Object(items)).map_err(storage_error)?;
            storage_local_set(items).await.map_err(storage_error)?;
            Ok(())
        })
    }
}
