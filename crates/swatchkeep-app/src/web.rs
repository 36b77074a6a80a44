//! WebAssembly entry points, one per extension context.
//!
//! The same module is loaded by the popup page, the background worker and
//! the page picker. The popup and picker loaders call their `start_*`
//! export; the worker forwards each message to `handle_background_message`.

use wasm_bindgen::prelude::*;

/// Runs once when the module is instantiated, in any context.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("Logger already initialized: {}", e)));
    }
}

/// Start the popup UI.
#[wasm_bindgen]
pub fn start_popup() {
    log::info!("Starting SwatchKeep popup");
    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = crate::popup::start().await {
            log::error!("Popup failed to start: {}", crate::chrome::describe(&e));
        }
    });
}

/// Handle a message delivered to the background worker.
#[wasm_bindgen]
pub fn handle_background_message(message: JsValue) {
    crate::background::dispatch(message);
}

/// Start the page picker.
#[wasm_bindgen]
pub fn start_content() {
    crate::content::install();
}
