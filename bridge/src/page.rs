//! The rendered page as seen by the bridge.
//!
//! [`Page`] is the only seam between the bridge and the DOM. Every lookup
//! re-resolves against the live document: nodes returned by one call may be
//! stale by the next, and implementations must tolerate being handed a node
//! that has since been detached.

use std::rc::Rc;

use crate::contract::ClickTarget;
use crate::overlay::OverlayBlueprint;

/// Failure of an individual DOM operation. Never fatal; callers log and move on.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    /// The host environment threw.
    #[error("dom call failed: {0}")]
    Js(String),
    /// The node is no longer attached where it was expected.
    #[error("node detached")]
    Detached,
    /// The node is not the kind of element the operation needs.
    #[error("unexpected element: {0}")]
    WrongElement(&'static str),
}

/// What sort of control the resolved input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    TextArea,
    TextInput,
    ContentEditable,
    /// Matched the selector but accepts neither value nor text content.
    Unsupported,
}

/// Synthetic events dispatched after writing into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    Input,
    Change,
}

impl SyntheticEvent {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
        }
    }
}

/// Raw observations forwarded from page listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    /// A click bubbled to the document.
    Click(ClickTarget),
    /// A keystroke, input or composition event in the widget input.
    InputActivity,
    /// The widget's form fired `submit`.
    FormSubmitted,
}

pub type SignalSink = Rc<dyn Fn(PageSignal)>;

/// Called with the catalog index of a pressed recommendation box.
pub type PickHandler = Rc<dyn Fn(usize)>;

pub trait Page {
    type Node: Clone;

    // --- Resolution ---

    /// First node matching [`crate::contract::INPUT_SELECTOR`].
    fn find_input(&self) -> Option<Self::Node>;

    fn input_kind(&self, input: &Self::Node) -> InputKind;

    /// Nearest named container of `input`, else nearest form or div.
    fn input_container(&self, input: &Self::Node) -> Option<Self::Node>;

    /// First node matching [`crate::contract::SUBMIT_SELECTOR`].
    fn find_submit(&self) -> Option<Self::Node>;

    fn find_nav_control(&self) -> Option<Self::Node>;

    fn find_backdrop(&self) -> Option<Self::Node>;

    /// The live overlay root, looked up by its marker class.
    fn find_overlay(&self) -> Option<Self::Node>;

    fn viewport_width(&self) -> f64;

    // --- Mutation ---

    /// Assign through the platform's native `value` setter.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the setter cannot be resolved or throws.
    fn write_value(&self, input: &Self::Node, text: &str) -> Result<(), PageError>;

    fn write_text_content(&self, input: &Self::Node, text: &str);

    /// Dispatch a bubbling synthetic event on `node`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the event cannot be constructed or dispatched.
    fn dispatch(&self, node: &Self::Node, event: SyntheticEvent) -> Result<(), PageError>;

    /// Activate `node` as a click would.
    fn activate(&self, node: &Self::Node);

    /// Request submission of the form enclosing `input`. `Ok(false)` when
    /// there is no enclosing form.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the form rejects the request.
    fn request_form_submit(&self, input: &Self::Node) -> Result<bool, PageError>;

    /// Build `blueprint` and insert it immediately before `anchor`.
    ///
    /// Each box intercepts its own clicks and activation keys so they never
    /// reach the widget, then calls `on_pick` with its index.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any element cannot be created or inserted.
    fn mount_overlay(
        &self,
        anchor: &Self::Node,
        blueprint: &OverlayBlueprint,
        on_pick: PickHandler,
    ) -> Result<Self::Node, PageError>;

    fn remove(&self, node: &Self::Node);

    /// Mirror the interaction guard onto the document.
    fn set_interaction_marker(&self, active: bool);

    // --- Listeners ---

    /// Install the document-level click listener, replacing any previous one.
    fn watch_document(&self, sink: SignalSink);

    /// Attach input and form listeners to the currently resolved input,
    /// replacing any previous ones. Returns `false` if no input was found.
    fn watch_input(&self, sink: SignalSink) -> bool;

    /// Drop every listener this page installed.
    fn unwatch(&self);
}
