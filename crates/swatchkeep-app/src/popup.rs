//! Popup UI: renders the current collection and edits it.

use crate::chrome::{self, ChromeStorage};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use swatchkeep_core::{
    Color, ColorFormat, Message, PaletteSession, PendingSave, PickError, PickOrchestrator, SlotView,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlSelectElement, Window};

/// Element the popup renders into.
const ROOT_ID: &str = "app";

/// How long the "Copied!" badge stays up, in milliseconds.
const COPIED_BADGE_MS: i32 = 1000;

type SharedPopup = Rc<RefCell<Popup>>;

struct Popup {
    session: PaletteSession<ChromeStorage>,
    picker: PickOrchestrator,
    window: Window,
    document: Document,
    root: Element,
}

/// Load the palette, render it and start listening for input.
pub async fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let root = document
        .get_element_by_id(ROOT_ID)
        .ok_or_else(|| JsValue::from_str("popup root element missing"))?;

    let session = PaletteSession::open(Arc::new(ChromeStorage))
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let popup = Rc::new(RefCell::new(Popup {
        session,
        picker: PickOrchestrator::new(),
        window,
        document,
        root,
    }));
    popup.borrow().render()?;
    install_handlers(&popup)?;
    Ok(())
}

fn install_handlers(popup: &SharedPopup) -> Result<(), JsValue> {
    let root = popup.borrow().root.clone();

    let on_click = {
        let popup = Rc::clone(popup);
        Closure::wrap(Box::new(move |event: Event| {
            let Some(target) = action_target(&event) else {
                return;
            };
            let action = target.get_attribute("data-action").unwrap_or_default();
            let index = target.get_attribute("data-index").and_then(|i| i.parse().ok());
            let format = target.get_attribute("data-format").and_then(|f| f.parse().ok());
            on_action(&popup, &target, &action, index, format);
        }) as Box<dyn FnMut(Event)>)
    };

    let on_change = {
        let popup = Rc::clone(popup);
        Closure::wrap(Box::new(move |event: Event| {
            let Some(select) = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlSelectElement>().ok())
            else {
                return;
            };
            if select.get_attribute("data-action").as_deref() == Some("switch") {
                let mut popup = popup.borrow_mut();
                let save = popup.session.switch_current(&select.value());
                popup.commit(save);
            }
        }) as Box<dyn FnMut(Event)>)
    };

    root.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    root.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
    on_click.forget();
    on_change.forget();

    let popup = Rc::clone(popup);
    chrome::on_message(move |message| {
        if let Message::ColorPicked { color, slot_index } = message {
            popup.borrow_mut().on_color_picked(slot_index, &color);
        }
    });
    Ok(())
}

/// The nearest element with a `data-action` attribute, from the event target up.
fn action_target(event: &Event) -> Option<Element> {
    let target: Element = event.target()?.dyn_into().ok()?;
    target.closest("[data-action]").ok().flatten()
}

fn on_action(
    shared: &SharedPopup,
    target: &Element,
    action: &str,
    index: Option<usize>,
    format: Option<ColorFormat>,
) {
    let mut popup = shared.borrow_mut();
    match (action, index) {
        ("pick", Some(index)) => {
            if let Err(e) = popup.picker.begin(index) {
                log::warn!("{}", e);
                return;
            }
            popup.rerender();
            wasm_bindgen_futures::spawn_local(request_pick(Rc::clone(shared), index));
        }
        ("copy", Some(index)) => {
            let format = format.unwrap_or_default();
            let slots = popup.session.slots();
            if let Some(text) = slots.get(index).and_then(|view| view.value(format)) {
                copy_text_to_clipboard(text);
                if let Err(e) = popup.flash_copied(target) {
                    log::debug!("No copied badge: {}", chrome::describe(&e));
                }
            }
        }
        ("remove", Some(index)) => {
            let save = popup.session.remove_color(index);
            popup.commit(save);
        }
        ("rename", _) => {
            let current = popup.session.store().current_name().to_string();
            if let Some(name) = popup.prompt("Enter new collection name:", &current) {
                let save = popup.session.rename_current(&name);
                popup.commit(save);
            }
        }
        ("new", _) => {
            if let Some(name) = popup.prompt("Enter new collection name:", "") {
                let save = popup.session.create_collection(&name);
                popup.commit(save);
            }
        }
        ("delete", _) => {
            let store = popup.session.store();
            if store.len() <= 1 {
                return;
            }
            let question = format!("Delete collection \"{}\"?", store.current_name());
            if popup.window.confirm_with_message(&question).unwrap_or(false) {
                let save = popup.session.delete_current();
                popup.commit(save);
            }
        }
        _ => log::debug!("Unhandled action {:?}", action),
    }
}

async fn request_pick(popup: SharedPopup, index: usize) {
    let message = Message::StartColorPick { slot_index: index };
    if let Err(e) = chrome::send_message(&message).await {
        log::error!("Error starting color pick: {}", e);
        let mut popup = popup.borrow_mut();
        if popup.picker.fail(e).is_ok() {
            popup.rerender();
        }
    }
}

/// Copy text to clipboard (fire and forget).
fn copy_text_to_clipboard(text: &str) {
    let text = text.to_string();
    wasm_bindgen_futures::spawn_local(async move {
        if let Some(window) = web_sys::window() {
            let clipboard = window.navigator().clipboard();
            let promise = clipboard.write_text(&text);
            match wasm_bindgen_futures::JsFuture::from(promise).await {
                Ok(_) => log::info!("Copied {}", text),
                Err(e) => log::error!("Failed to copy {}: {}", text, chrome::describe(&e)),
            }
        }
    });
}

impl Popup {
    fn on_color_picked(&mut self, slot: usize, text: &str) {
        let color = match self.picker.resolve(slot, text) {
            Ok(color) => color,
            // Not ours (e.g. the popup was reopened mid-pick); the store
            // still takes the color, same as the background does.
            Err(PickError::NotPending | PickError::SlotMismatch { .. }) => match Color::parse(text) {
                Some(color) => color,
                None => return,
            },
            Err(e) => {
                log::warn!("{}", e);
                self.rerender();
                return;
            }
        };
        let save = self.session.set_color(slot, color);
        self.commit(save);
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        self.window
            .prompt_with_message_and_default(message, default)
            .ok()
            .flatten()
            .filter(|name| !name.trim().is_empty())
    }

    /// Show a short-lived "Copied!" badge on `target`.
    fn flash_copied(&self, target: &Element) -> Result<(), JsValue> {
        let badge = self.element("span", "copied-badge")?;
        badge.set_text_content(Some("Copied!"));
        target.append_child(&badge)?;

        let dismiss = Closure::once_into_js(move || badge.remove());
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(dismiss.unchecked_ref(), COPIED_BADGE_MS)?;
        Ok(())
    }

    /// Start the pending write, if any, and redraw.
    fn commit(&self, save: Option<PendingSave>) {
        if let Some(save) = save {
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = save.await {
                    log::error!("Failed to save palette: {}", e);
                }
            });
        }
        self.rerender();
    }

    fn rerender(&self) {
        if let Err(e) = self.render() {
            log::error!("Failed to render palette: {}", chrome::describe(&e));
        }
    }

    fn render(&self) -> Result<(), JsValue> {
        self.root.set_inner_html("");
        self.root.append_child(&self.render_header()?)?;

        let palette = self.element("div", "palette")?;
        let picking = self.picker.state().is_pending().then(|| self.picker.state().slot()).flatten();
        for view in self.session.slots() {
            palette.append_child(&self.render_slot(&view, picking == Some(view.index))?)?;
        }
        self.root.append_child(&palette)?;
        Ok(())
    }

    fn render_header(&self) -> Result<Element, JsValue> {
        let store = self.session.store();
        let header = self.element("div", "header")?;

        let select: HtmlSelectElement = self.element("select", "collection-name")?.dyn_into()?;
        select.set_attribute("data-action", "switch")?;
        for name in store.names() {
            let option = self.element("option", "")?;
            option.set_attribute("value", name)?;
            option.set_text_content(Some(name));
            select.append_child(&option)?;
        }
        select.set_value(store.current_name());
        header.append_child(&select)?;

        let settings = self.element("details", "collection-settings")?;
        let summary = self.element("summary", "")?;
        summary.set_text_content(Some("⚙"));
        settings.append_child(&summary)?;
        let menu = self.element("div", "settings-menu")?;
        for (action, label) in [("rename", "Rename"), ("new", "New"), ("delete", "Delete")] {
            let item = self.element("div", &format!("{}-collection", action))?;
            item.set_attribute("data-action", action)?;
            item.set_text_content(Some(label));
            menu.append_child(&item)?;
        }
        settings.append_child(&menu)?;
        header.append_child(&settings)?;

        Ok(header)
    }

    fn render_slot(&self, view: &SlotView, picking: bool) -> Result<Element, JsValue> {
        let index = view.index.to_string();
        let slot = self.element("div", "color-slot")?;

        let mut preview_class = String::from("color-preview");
        if view.is_blank {
            preview_class.push_str(" blank-swatch");
        }
        if picking {
            preview_class.push_str(" picking");
        }
        let preview = self.element("div", &preview_class)?;
        preview.set_attribute("data-action", "pick")?;
        preview.set_attribute("data-index", &index)?;
        if !view.is_blank {
            preview.set_attribute("style", &format!("background-color: {}", view.hex))?;
        }
        slot.append_child(&preview)?;

        let value = self.element("span", "color-value")?;
        value.set_text_content(Some(view.hex.as_str()));
        if !view.is_blank {
            value.set_attribute("data-action", "copy")?;
            value.set_attribute("data-format", "hex")?;
            value.set_attribute("data-index", &index)?;
        }
        slot.append_child(&value)?;

        if !view.is_blank {
            let alternates = self.element("details", "alternate-values")?;
            let arrow = self.element("summary", "dropdown-arrow")?;
            arrow.set_text_content(Some("▼"));
            alternates.append_child(&arrow)?;

            let menu = self.element("div", "alternate-values-menu")?;
            for (format, text) in [("rgb", &view.rgb), ("hsl", &view.hsl)] {
                let item = self.element("div", &format!("{}-value", format))?;
                item.set_attribute("data-action", "copy")?;
                item.set_attribute("data-format", format)?;
                item.set_attribute("data-index", &index)?;
                item.set_text_content(Some(text.as_str()));
                menu.append_child(&item)?;
            }
            let remove = self.element("div", "remove-color")?;
            remove.set_attribute("data-action", "remove")?;
            remove.set_attribute("data-index", &index)?;
            remove.set_text_content(Some("Remove"));
            menu.append_child(&remove)?;

            alternates.append_child(&menu)?;
            slot.append_child(&alternates)?;
        }

        Ok(slot)
    }

    fn element(&self, tag: &str, class: &str) -> Result<Element, JsValue> {
        let element = self.document.create_element(tag)?;
        if !class.is_empty() {
            element.set_class_name(class);
        }
        Ok(element)
    }
}
