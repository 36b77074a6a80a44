//! Page-side picker: samples a color when the background asks for one.

use crate::chrome;
use js_sys::{Function, Promise, Reflect};
use std::cell::RefCell;
use swatchkeep_core::storage::BoxFuture;
use swatchkeep_core::{ColorSampler, Message, PickOrchestrator, PickOutcome, SampleError, SampleResult, sample_with_fallback};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlElement, KeyboardEvent, MouseEvent, Window};

/// Set on the page's global object once the listener is installed.
const INSTALLED_FLAG: &str = "__swatchkeepPicker";

thread_local! {
    static PICKER: RefCell<PickOrchestrator> = RefCell::new(PickOrchestrator::new());
}

/// Install the `requestColorPick` listener, once per page.
pub fn install() {
    let global = js_sys::global();
    let flag = JsValue::from_str(INSTALLED_FLAG);
    if Reflect::get(&global, &flag).is_ok_and(|v| v.is_truthy()) {
        log::debug!("Picker already installed");
        return;
    }
    if Reflect::set(&global, &flag, &JsValue::TRUE).is_err() {
        log::warn!("Could not mark picker as installed");
    }

    chrome::on_message(|message| {
        if let Message::RequestColorPick { slot_index } = message {
            wasm_bindgen_futures::spawn_local(pick(slot_index));
        }
    });
}

async fn pick(slot: usize) {
    if let Err(e) = PICKER.with(|p| p.borrow_mut().begin(slot)) {
        log::warn!("Ignoring pick request: {}", e);
        return;
    }

    let outcome = sample_with_fallback(&EyeDropperSampler, &OverlaySampler).await;

    let picked = PICKER.with(|p| {
        let mut picker = p.borrow_mut();
        match outcome {
            PickOutcome::Picked(text) => picker.resolve(slot, &text).map_err(|e| e.to_string()),
            PickOutcome::Abandoned => {
                if let Err(e) = picker.abandon() {
                    log::debug!("{}", e);
                }
                Err("abandoned".to_string())
            }
        }
    });

    match picked {
        Ok(color) => {
            let message = Message::ColorPicked {
                color: color.to_hex(),
                slot_index: slot,
            };
            if let Err(e) = chrome::send_message(&message).await {
                log::error!("Failed to report picked color: {}", e);
            }
        }
        Err(reason) => log::info!("No color picked for slot {}: {}", slot, reason),
    }
}

/// The browser's native `EyeDropper`.
struct EyeDropperSampler;

impl ColorSampler for EyeDropperSampler {
    fn sample(&self) -> BoxFuture<'_, SampleResult<String>> {
        Box::pin(async move {
            let ctor = Reflect::get(&js_sys::global(), &JsValue::from_str("EyeDropper"))
                .ok()
                .and_then(|c| c.dyn_into::<Function>().ok())
                .ok_or(SampleError::Unsupported)?;

            let dropper = Reflect::construct(&ctor, &js_sys::Array::new())
                .map_err(|e| SampleError::Failed(chrome::describe(&e)))?;
            let open: Function = Reflect::get(&dropper, &JsValue::from_str("open"))
                .and_then(|f| f.dyn_into())
                .map_err(|_| SampleError::Unsupported)?;
            let promise: Promise = open
                .call0(&dropper)
                .and_then(|p| p.dyn_into())
                .map_err(|e| SampleError::Failed(chrome::describe(&e)))?;

            let result = JsFuture::from(promise).await.map_err(|e| {
                let name = Reflect::get(&e, &JsValue::from_str("name"))
                    .ok()
                    .and_then(|n| n.as_string());
                match name.as_deref() {
                    Some("AbortError") => SampleError::Cancelled,
                    _ => SampleError::Failed(chrome::describe(&e)),
                }
            })?;

            Reflect::get(&result, &JsValue::from_str("sRGBHex"))
                .ok()
                .and_then(|hex| hex.as_string())
                .ok_or_else(|| SampleError::Failed("EyeDropper returned no color".to_string()))
        })
    }
}

/// A full-page crosshair overlay that reads the background color of the
/// element under the cursor. Escape dismisses it.
struct OverlaySampler;

impl ColorSampler for OverlaySampler {
    fn sample(&self) -> BoxFuture<'_, SampleResult<String>> {
        Box::pin(async move {
            let promise = Promise::new(&mut |resolve, reject| {
                if let Err(e) = show_overlay(resolve, reject.clone()) {
                    let _ = reject.call1(&JsValue::NULL, &e);
                }
            });

            match JsFuture::from(promise).await {
                Ok(color) => color
                    .as_string()
                    .ok_or_else(|| SampleError::Failed("overlay returned no color".to_string())),
                Err(e) if e.is_undefined() => Err(SampleError::Cancelled),
                Err(e) => Err(SampleError::Failed(chrome::describe(&e))),
            }
        })
    }
}

fn show_overlay(resolve: Function, reject: Function) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

    let overlay: HtmlElement = document.create_element("div")?.dyn_into()?;
    for (name, value) in [
        ("position", "fixed"),
        ("top", "0"),
        ("left", "0"),
        ("width", "100%"),
        ("height", "100%"),
        ("z-index", "2147483647"),
        ("cursor", "crosshair"),
    ] {
        overlay.style().set_property(name, value)?;
    }

    let preview: HtmlElement = document.create_element("div")?.dyn_into()?;
    for (name, value) in [
        ("position", "fixed"),
        ("width", "24px"),
        ("height", "24px"),
        ("border", "2px solid #fff"),
        ("border-radius", "50%"),
        ("box-shadow", "0 0 2px rgba(0, 0, 0, 0.6)"),
        ("pointer-events", "none"),
    ] {
        preview.style().set_property(name, value)?;
    }
    overlay.append_child(&preview)?;
    body.append_child(&overlay)?;

    let on_move = {
        let (window, document, overlay, preview) = (window.clone(), document.clone(), overlay.clone(), preview.clone());
        Closure::wrap(Box::new(move |event: MouseEvent| {
            let (x, y) = (event.client_x(), event.client_y());
            let style = preview.style();
            let _ = style.set_property("left", &format!("{}px", x + 12));
            let _ = style.set_property("top", &format!("{}px", y + 12));
            if let Some(color) = color_at(&window, &document, &overlay, x, y) {
                let _ = style.set_property("background-color", &color);
            }
        }) as Box<dyn FnMut(MouseEvent)>)
    };

    // Escape is listened for on the document, so it must be detached on
    // every exit path.
    let on_key_slot: std::rc::Rc<RefCell<Option<Function>>> = Default::default();

    let on_click = {
        let (window, document, overlay, on_key_slot) =
            (window.clone(), document.clone(), overlay.clone(), on_key_slot.clone());
        let (resolve, reject) = (resolve.clone(), reject.clone());
        Closure::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            let color = color_at(&window, &document, &overlay, event.client_x(), event.client_y());
            close_overlay(&document, &overlay, &on_key_slot);
            match color {
                Some(color) => {
                    let _ = resolve.call1(&JsValue::NULL, &JsValue::from_str(&color));
                }
                None => {
                    let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("nothing under the cursor"));
                }
            }
        }) as Box<dyn FnMut(MouseEvent)>)
    };

    let on_key = {
        let (document, overlay, on_key_slot) = (document.clone(), overlay.clone(), on_key_slot.clone());
        Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if event.key() == "Escape" {
                event.prevent_default();
                close_overlay(&document, &overlay, &on_key_slot);
                let _ = reject.call1(&JsValue::NULL, &JsValue::UNDEFINED);
            }
        }) as Box<dyn FnMut(KeyboardEvent)>)
    };

    overlay.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
    overlay.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    let on_key_fn: &Function = on_key.as_ref().unchecked_ref();
    document.add_event_listener_with_callback("keydown", on_key_fn)?;
    *on_key_slot.borrow_mut() = Some(on_key_fn.clone());

    on_move.forget();
    on_click.forget();
    on_key.forget();
    Ok(())
}

fn close_overlay(document: &Document, overlay: &HtmlElement, on_key: &RefCell<Option<Function>>) {
    overlay.remove();
    if let Some(listener) = on_key.borrow_mut().take() {
        let _ = document.remove_event_listener_with_callback("keydown", &listener);
    }
}

/// Computed background color of the page element at `(x, y)`, looking
/// through the overlay.
fn color_at(window: &Window, document: &Document, overlay: &HtmlElement, x: i32, y: i32) -> Option<String> {
    let style = overlay.style();
    style.set_property("pointer-events", "none").ok()?;
    let element = document.element_from_point(x as f32, y as f32);
    style.set_property("pointer-events", "auto").ok()?;

    window
        .get_computed_style(&element?)
        .ok()
        .flatten()?
        .get_property_value("background-color")
        .ok()
}
