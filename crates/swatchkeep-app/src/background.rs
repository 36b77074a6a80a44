//! Background worker: routes extension messages.

use crate::chrome::{self, ChromeStorage};
use std::rc::Rc;
use std::sync::Arc;
use swatchkeep_core::storage::BoxFuture;
use swatchkeep_core::{BackgroundRouter, ExtensionHost, HostError, Message, TabId};
use wasm_bindgen::JsValue;

/// The browser, as seen from the background worker.
struct ChromeHost;

impl ExtensionHost for ChromeHost {
    fn active_tab(&self) -> BoxFuture<'_, Option<TabId>> {
        Box::pin(chrome::active_tab())
    }

    fn inject_picker(&self, tab: TabId) -> BoxFuture<'_, Result<(), HostError>> {
        Box::pin(async move {
            chrome::inject_content_script(tab)
                .await
                .map_err(HostError::Injection)
        })
    }

    fn send_to_tab(&self, tab: TabId, message: Message) -> BoxFuture<'_, Result<(), HostError>> {
        Box::pin(async move {
            chrome::send_to_tab(tab, &message)
                .await
                .map_err(HostError::Delivery)
        })
    }
}

thread_local! {
    static ROUTER: Rc<BackgroundRouter<ChromeHost, ChromeStorage>> =
        Rc::new(BackgroundRouter::new(ChromeHost, Arc::new(ChromeStorage)));
}

/// Route one runtime message.
///
/// The worker's loader owns the `onMessage` listener so that it is in place
/// before the module finishes loading; it forwards here once ready.
pub fn dispatch(message: JsValue) {
    let Some(message) = chrome::decode_message(&message) else {
        return;
    };
    let router = ROUTER.with(Rc::clone);
    let action = message.action();
    wasm_bindgen_futures::spawn_local(async move {
        match router.handle(message).await {
            Ok(outcome) => log::debug!("{} handled: {:?}", action, outcome),
            Err(e) => log::error!("{} failed: {}", action, e),
        }
    });
}
