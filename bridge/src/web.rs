//! Browser implementation of [`Page`] over `web-sys`.
//!
//! This module is the only place that touches the real DOM. Lookups go
//! through the selectors in [`crate::contract`]; every fallible DOM call is
//! mapped to [`PageError`] or logged and dropped, never unwrapped.

use std::cell::RefCell;

use gloo_timers::callback::Timeout;
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, EventInit, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent, Window};

use crate::contract::{
    BACKDROP_SELECTOR, ClickTarget, INPUT_SELECTOR, INTERACTION_FLAG_ATTR, NAMED_CONTAINER_SELECTOR,
    NAV_CONTROL_SELECTOR, OVERLAY_CLASS, STRUCTURAL_CONTAINER_SELECTOR, SUBMIT_SELECTOR, is_activation_key,
};
use crate::listener::EventListener;
use crate::overlay::OverlayBlueprint;
use crate::page::{InputKind, Page, PageError, PickHandler, PageSignal, SignalSink, SyntheticEvent};

fn js_err(err: JsValue) -> PageError {
    PageError::Js(format!("{err:?}"))
}

/// Live document of the current window.
pub struct WebPage {
    window: Window,
    document: Document,
    document_listeners: RefCell<Vec<EventListener>>,
    input_listeners: RefCell<Vec<EventListener>>,
    overlay_listeners: RefCell<Vec<EventListener>>,
}

impl WebPage {
    /// The page of the global window, if running in a browser.
    #[must_use]
    pub fn current() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            document_listeners: RefCell::new(Vec::new()),
            input_listeners: RefCell::new(Vec::new()),
            overlay_listeners: RefCell::new(Vec::new()),
        })
    }

    fn query(&self, selector: &str) -> Option<Element> {
        match self.document.query_selector(selector) {
            Ok(found) => found,
            Err(err) => {
                log::debug!("page: query {selector} failed: {err:?}");
                None
            }
        }
    }

    fn closest(node: &Element, selector: &str) -> Option<Element> {
        match node.closest(selector) {
            Ok(found) => found,
            Err(err) => {
                log::debug!("page: closest {selector} failed: {err:?}");
                None
            }
        }
    }

    fn create(&self, tag: &str, class: &str) -> Result<Element, PageError> {
        let element = self.document.create_element(tag).map_err(js_err)?;
        element.set_class_name(class);
        Ok(element)
    }

    fn build_overlay(&self, blueprint: &OverlayBlueprint, on_pick: &PickHandler) -> Result<Element, PageError> {
        let overlay = self.create("div", blueprint.wrapper_class)?;
        let container = self.create("div", blueprint.container_class)?;
        let mut listeners = Vec::with_capacity(blueprint.boxes.len() * 2);

        for item in &blueprint.boxes {
            let tile = self.create("div", blueprint.box_class)?;
            tile.set_attribute("role", blueprint.box_role).map_err(js_err)?;
            tile.set_attribute("tabindex", &blueprint.box_tabindex.to_string()).map_err(js_err)?;

            let icon = self.create("span", blueprint.icon_class)?;
            icon.set_text_content(Some(item.icon.as_str()));
            let text = self.create("p", blueprint.text_class)?;
            text.set_text_content(Some(item.text.as_str()));
            tile.append_child(&icon).map_err(js_err)?;
            tile.append_child(&text).map_err(js_err)?;

            // Capture phase on the box itself: nothing bound on widget
            // ancestors ever sees the event.
            let index = item.index;
            let pick = on_pick.clone();
            listeners.push(EventListener::new(&tile, "click", true, move |event| {
                event.prevent_default();
                event.stop_propagation();
                event.stop_immediate_propagation();
                pick(index);
            })?);
            let pick = on_pick.clone();
            listeners.push(EventListener::new(&tile, "keydown", true, move |event| {
                let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
                    return;
                };
                if !is_activation_key(&key) {
                    return;
                }
                event.prevent_default();
                event.stop_propagation();
                event.stop_immediate_propagation();
                pick(index);
            })?);

            container.append_child(&tile).map_err(js_err)?;
        }

        overlay.append_child(&container).map_err(js_err)?;
        *self.overlay_listeners.borrow_mut() = listeners;
        Ok(overlay)
    }

    /// Resolve the platform's own `value` setter for this control's prototype.
    fn native_value_setter(&self, input: &Element) -> Result<Function, PageError> {
        let constructor = if input.has_type::<HtmlTextAreaElement>() {
            "HTMLTextAreaElement"
        } else if input.has_type::<HtmlInputElement>() {
            "HTMLInputElement"
        } else {
            return Err(PageError::WrongElement("value control"));
        };
        let class = Reflect::get(&self.window, &JsValue::from_str(constructor)).map_err(js_err)?;
        let prototype = Reflect::get(&class, &JsValue::from_str("prototype")).map_err(js_err)?;
        let prototype: Object = prototype.dyn_into().map_err(js_err)?;
        let descriptor = Object::get_own_property_descriptor(&prototype, &JsValue::from_str("value"));
        let setter = Reflect::get(&descriptor, &JsValue::from_str("set")).map_err(js_err)?;
        setter.dyn_into::<Function>().map_err(js_err)
    }

    fn click_target(event: &web_sys::Event) -> Option<ClickTarget> {
        let element = event.target()?.dyn_into::<Element>().ok_or_log()?;
        Some(ClickTarget {
            text: element.text_content(),
            aria_label: element.get_attribute("aria-label"),
            within_send_control: Self::closest(&element, SUBMIT_SELECTOR).is_some(),
        })
    }
}

trait OkOrLog<T> {
    fn ok_or_log(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> OkOrLog<T> for Result<T, E> {
    fn ok_or_log(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                log::trace!("page: ignored {err:?}");
                None
            }
        }
    }
}

impl Page for WebPage {
    type Node = Element;

    fn find_input(&self) -> Option<Element> {
        self.query(INPUT_SELECTOR)
    }

    fn input_kind(&self, input: &Element) -> InputKind {
        if input.has_type::<HtmlTextAreaElement>() {
            InputKind::TextArea
        } else if input.has_type::<HtmlInputElement>() {
            InputKind::TextInput
        } else if input.dyn_ref::<HtmlElement>().is_some_and(HtmlElement::is_content_editable) {
            InputKind::ContentEditable
        } else {
            InputKind::Unsupported
        }
    }

    fn input_container(&self, input: &Element) -> Option<Element> {
        let parent = input.parent_element()?;
        Self::closest(&parent, NAMED_CONTAINER_SELECTOR).or_else(|| Self::closest(&parent, STRUCTURAL_CONTAINER_SELECTOR))
    }

    fn find_submit(&self) -> Option<Element> {
        self.query(SUBMIT_SELECTOR)
    }

    fn find_nav_control(&self) -> Option<Element> {
        self.query(NAV_CONTROL_SELECTOR)
    }

    fn find_backdrop(&self) -> Option<Element> {
        self.query(BACKDROP_SELECTOR)
    }

    fn find_overlay(&self) -> Option<Element> {
        self.query(&format!(".{OVERLAY_CLASS}"))
    }

    fn viewport_width(&self) -> f64 {
        match self.window.inner_width() {
            Ok(width) => width.as_f64().unwrap_or(f64::INFINITY),
            Err(_) => f64::INFINITY,
        }
    }

    fn write_value(&self, input: &Element, text: &str) -> Result<(), PageError> {
        let setter = self.native_value_setter(input)?;
        setter.call1(input, &JsValue::from_str(text)).map_err(js_err)?;
        Ok(())
    }

    fn write_text_content(&self, input: &Element, text: &str) {
        input.set_text_content(Some(text));
    }

    fn dispatch(&self, node: &Element, event: SyntheticEvent) -> Result<(), PageError> {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = web_sys::Event::new_with_event_init_dict(event.name(), &init).map_err(js_err)?;
        node.dispatch_event(&event).map_err(js_err)?;
        Ok(())
    }

    fn activate(&self, node: &Element) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            element.click();
        }
    }

    fn request_form_submit(&self, input: &Element) -> Result<bool, PageError> {
        let Some(form) = Self::closest(input, "form") else {
            return Ok(false);
        };
        let form: HtmlFormElement = form.dyn_into().map_err(|_| PageError::WrongElement("form"))?;
        form.request_submit().map_err(js_err)?;
        Ok(true)
    }

    fn mount_overlay(&self, anchor: &Element, blueprint: &OverlayBlueprint, on_pick: PickHandler) -> Result<Element, PageError> {
        if !anchor.is_connected() {
            return Err(PageError::Detached);
        }
        let overlay = self.build_overlay(blueprint, &on_pick)?;
        anchor.insert_adjacent_element("beforebegin", &overlay).map_err(js_err)?;
        Ok(overlay)
    }

    fn remove(&self, node: &Element) {
        node.remove();
        if node.class_list().contains(OVERLAY_CLASS) {
            // Removal usually runs inside one of these listeners; free them
            // on the next tick rather than under their own call.
            let retired = std::mem::take(&mut *self.overlay_listeners.borrow_mut());
            Timeout::new(0, move || drop(retired)).forget();
        }
    }

    fn set_interaction_marker(&self, active: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        let result = if active {
            body.set_attribute(INTERACTION_FLAG_ATTR, "true")
        } else {
            body.remove_attribute(INTERACTION_FLAG_ATTR)
        };
        if let Err(err) = result {
            log::debug!("page: interaction marker failed: {err:?}");
        }
    }

    fn watch_document(&self, sink: SignalSink) {
        let listener = EventListener::new(&self.document, "click", false, move |event| {
            if let Some(target) = Self::click_target(&event) {
                sink(PageSignal::Click(target));
            }
        });
        let listeners = match listener {
            Ok(listener) => vec![listener],
            Err(err) => {
                log::debug!("page: document listener failed: {err}");
                Vec::new()
            }
        };
        *self.document_listeners.borrow_mut() = listeners;
    }

    fn watch_input(&self, sink: SignalSink) -> bool {
        let Some(input) = self.find_input() else {
            self.input_listeners.borrow_mut().clear();
            return false;
        };
        let mut listeners = Vec::new();
        for kind in ["input", "keydown", "compositionstart"] {
            let sink = sink.clone();
            match EventListener::new(&input, kind, false, move |_| sink(PageSignal::InputActivity)) {
                Ok(listener) => listeners.push(listener),
                Err(err) => log::debug!("page: {kind} listener failed: {err}"),
            }
        }
        if let Some(form) = Self::closest(&input, "form") {
            let sink = sink.clone();
            match EventListener::new(&form, "submit", false, move |_| sink(PageSignal::FormSubmitted)) {
                Ok(listener) => listeners.push(listener),
                Err(err) => log::debug!("page: submit listener failed: {err}"),
            }
        }
        *self.input_listeners.borrow_mut() = listeners;
        true
    }

    fn unwatch(&self) {
        self.document_listeners.borrow_mut().clear();
        self.input_listeners.borrow_mut().clear();
        self.overlay_listeners.borrow_mut().clear();
    }
}
