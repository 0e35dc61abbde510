//! Event listener that detaches itself when dropped.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventTarget};

use crate::page::PageError;

pub struct EventListener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    /// Attach `handler` to `target` for `kind` events.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the browser rejects the registration.
    pub fn new(
        target: &EventTarget,
        kind: &'static str,
        capture: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, PageError> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback_and_bool(kind, callback.as_ref().unchecked_ref(), capture)
            .map_err(|err| PageError::Js(format!("{err:?}")))?;
        Ok(Self { target: target.clone(), kind, capture, callback })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        if let Err(err) = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        ) {
            log::trace!("listener: remove {} failed: {err:?}", self.kind);
        }
    }
}
