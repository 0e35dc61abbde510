//! In-memory page for exercising the bridge without a browser.
//!
//! Models just enough of a document tree to stand in for the chat widget:
//! element kinds, classes, labels, values, parent/child links and the
//! listeners the bridge installs. Test helpers simulate what a user (or the
//! widget) would do to the page.

use std::cell::{Cell, RefCell};

use crate::contract::{
    ClickTarget, OVERLAY_CLASS, container_match, is_activation_key, is_nav_control_label, is_submit_button, is_widget_backdrop_class,
};
use crate::overlay::OverlayBlueprint;
use crate::page::{InputKind, Page, PageError, PickHandler, PageSignal, SignalSink, SyntheticEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn body() -> Self {
        BODY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Body,
    Div,
    Aside,
    Form,
    Span,
    P,
    TextArea,
    TextInput,
    Editable,
    Button,
}

impl Tag {
    fn name(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Div | Self::Editable => "div",
            Self::Aside => "aside",
            Self::Form => "form",
            Self::Span => "span",
            Self::P => "p",
            Self::TextArea => "textarea",
            Self::TextInput => "input",
            Self::Button => "button",
        }
    }
}

#[derive(Debug, Clone)]
struct FakeNode {
    tag: Tag,
    class: String,
    aria_label: Option<String>,
    button_type: Option<String>,
    role: Option<String>,
    tabindex: Option<i32>,
    text: String,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl FakeNode {
    fn new(tag: Tag) -> Self {
        Self {
            tag,
            class: String::new(),
            aria_label: None,
            button_type: None,
            role: None,
            tabindex: None,
            text: String::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Ids of the widget parts built by [`FakePage::widget`].
#[derive(Debug, Clone, Copy)]
pub struct WidgetParts {
    pub sidebar: NodeId,
    pub new_chat: NodeId,
    pub container: NodeId,
    pub form: NodeId,
    pub input: NodeId,
    pub submit: Option<NodeId>,
}

pub struct FakePage {
    nodes: RefCell<Vec<FakeNode>>,
    width: Cell<f64>,
    marker: Cell<bool>,
    marker_history: RefCell<Vec<bool>>,
    document_sink: RefCell<Option<SignalSink>>,
    input_sink: RefCell<Option<(NodeId, SignalSink)>>,
    document_watches: Cell<usize>,
    input_watches: Cell<usize>,
    picks: RefCell<Vec<(NodeId, usize, PickHandler)>>,
    submissions: RefCell<Vec<String>>,
    activations: RefCell<Vec<NodeId>>,
    dispatched: RefCell<Vec<(NodeId, SyntheticEvent)>>,
}

const BODY: NodeId = NodeId(0);

impl FakePage {
    /// A document with only a body.
    pub fn empty() -> Self {
        Self {
            nodes: RefCell::new(vec![FakeNode::new(Tag::Body)]),
            width: Cell::new(1280.0),
            marker: Cell::new(false),
            marker_history: RefCell::new(Vec::new()),
            document_sink: RefCell::new(None),
            input_sink: RefCell::new(None),
            document_watches: Cell::new(0),
            input_watches: Cell::new(0),
            picks: RefCell::new(Vec::new()),
            submissions: RefCell::new(Vec::new()),
            activations: RefCell::new(Vec::new()),
            dispatched: RefCell::new(Vec::new()),
        }
    }

    /// A chat widget: a sidebar with a "New Chat" button, and a named
    /// container holding a form with a textarea and a send button.
    pub fn widget() -> (Self, WidgetParts) {
        let page = Self::empty();
        let parts = page.build_widget(Tag::TextArea, true);
        (page, parts)
    }

    /// Like [`FakePage::widget`] with an editable region instead of a textarea.
    pub fn editable_widget() -> (Self, WidgetParts) {
        let page = Self::empty();
        let parts = page.build_widget(Tag::Editable, true);
        (page, parts)
    }

    /// Like [`FakePage::widget`] without any send button.
    pub fn widget_without_submit() -> (Self, WidgetParts) {
        let page = Self::empty();
        let parts = page.build_widget(Tag::TextArea, false);
        (page, parts)
    }

    pub fn build_widget(&self, input_tag: Tag, with_submit: bool) -> WidgetParts {
        let sidebar = self.append(BODY, Tag::Aside, "sidebar");
        let new_chat = self.append(sidebar, Tag::Button, "sidebar-item");
        self.set_text(new_chat, "New Chat");
        let container = self.append(BODY, Tag::Div, "chat-input-container");
        let form = self.append(container, Tag::Form, "composer");
        let input = self.append(form, input_tag, "composer-input");
        let submit = with_submit.then(|| {
            let button = self.append(form, Tag::Button, "composer-send");
            self.with_node(button, |n| {
                n.button_type = Some("submit".into());
                n.aria_label = Some("Send message".into());
            });
            button
        });
        WidgetParts { sidebar, new_chat, container, form, input, submit }
    }

    // =============================================================
    // Tree editing
    // =============================================================

    pub fn append(&self, parent: NodeId, tag: Tag, class: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        let mut node = FakeNode::new(tag);
        node.class = class.to_owned();
        node.parent = Some(parent);
        nodes.push(node);
        nodes[parent.0].children.push(id);
        id
    }

    pub fn set_text(&self, id: NodeId, text: &str) {
        self.with_node(id, |n| n.text = text.to_owned());
    }

    pub fn set_aria_label(&self, id: NodeId, label: &str) {
        self.with_node(id, |n| n.aria_label = Some(label.to_owned()));
    }

    pub fn set_width(&self, width: f64) {
        self.width.set(width);
    }

    /// Add a "Close menu" control to the sidebar.
    pub fn add_nav_close(&self, sidebar: NodeId) -> NodeId {
        let id = self.append(sidebar, Tag::Button, "icon-button");
        self.set_aria_label(id, "Close menu");
        id
    }

    /// Add a drawer backdrop to the body.
    pub fn add_backdrop(&self) -> NodeId {
        self.append(BODY, Tag::Div, "drawer-backdrop")
    }

    /// Move `sidebar` into a full-screen drawer overlay, the layout where the
    /// backdrop is the sidebar's own ancestor.
    pub fn wrap_in_drawer(&self, sidebar: NodeId) -> NodeId {
        let drawer = self.append(BODY, Tag::Div, "drawer-overlay");
        self.detach(sidebar);
        let mut nodes = self.nodes.borrow_mut();
        nodes[sidebar.0].parent = Some(drawer);
        nodes[drawer.0].children.push(sidebar);
        drawer
    }

    /// Detach a node, as the widget does when it re-renders.
    pub fn detach(&self, id: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[id.0].parent.take() {
            nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Replace the input with a fresh element in the same form.
    pub fn rerender_input(&self, parts: &WidgetParts) -> NodeId {
        let tag = self.nodes.borrow()[parts.input.0].tag;
        self.detach(parts.input);
        let id = self.append(parts.form, tag, "composer-input");
        // Keep the input ahead of the send button in document order.
        let mut nodes = self.nodes.borrow_mut();
        let children = &mut nodes[parts.form.0].children;
        children.retain(|c| *c != id);
        children.insert(0, id);
        id
    }

    fn with_node(&self, id: NodeId, f: impl FnOnce(&mut FakeNode)) {
        f(&mut self.nodes.borrow_mut()[id.0]);
    }

    fn node(&self, id: NodeId) -> FakeNode {
        self.nodes.borrow()[id.0].clone()
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = id;
        loop {
            if current == BODY {
                return true;
            }
            match nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Attached nodes in document order.
    fn document_order(&self) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack = vec![BODY];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in nodes[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    fn first(&self, pred: impl Fn(&FakeNode) -> bool) -> Option<NodeId> {
        self.document_order().into_iter().find(|id| pred(&self.node(*id)))
    }

    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut current = nodes[id.0].parent;
        while let Some(parent) = current {
            out.push(parent);
            current = nodes[parent.0].parent;
        }
        out
    }

    fn text_content(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut text = node.text.clone();
        for child in node.children {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn is_input(node: &FakeNode) -> bool {
        matches!(node.tag, Tag::TextArea | Tag::TextInput | Tag::Editable)
    }

    fn is_submit(node: &FakeNode) -> bool {
        node.tag == Tag::Button && is_submit_button(node.button_type.as_deref(), node.aria_label.as_deref())
    }

    // =============================================================
    // Inspection
    // =============================================================

    pub fn overlay_count(&self) -> usize {
        self.document_order()
            .into_iter()
            .filter(|id| self.node(*id).class.split_whitespace().any(|c| c == OVERLAY_CLASS))
            .count()
    }

    /// The node immediately after the overlay among its siblings.
    pub fn overlay_next_sibling(&self) -> Option<NodeId> {
        let overlay = self.find_overlay()?;
        let parent = self.node(overlay).parent?;
        let siblings = self.node(parent).children;
        let pos = siblings.iter().position(|c| *c == overlay)?;
        siblings.get(pos + 1).copied()
    }

    /// `(role, tabindex, icon, text)` of every live box, in order.
    pub fn overlay_boxes(&self) -> Vec<(Option<String>, Option<i32>, String, String)> {
        self.picks
            .borrow()
            .iter()
            .filter(|(id, _, _)| self.is_attached(*id))
            .map(|(id, _, _)| {
                let node = self.node(*id);
                let icon = node.children.first().map(|c| self.node(*c).text).unwrap_or_default();
                let text = node.children.get(1).map(|c| self.node(*c).text).unwrap_or_default();
                (node.role, node.tabindex, icon, text)
            })
            .collect()
    }

    /// Current value (or text content) of the live input.
    pub fn input_content(&self) -> Option<String> {
        let id = self.find_input()?;
        let node = self.node(id);
        Some(if node.tag == Tag::Editable { node.text } else { node.value })
    }

    /// Input content captured at each submit activation or form submission.
    pub fn submissions(&self) -> Vec<String> {
        self.submissions.borrow().clone()
    }

    pub fn activations(&self) -> Vec<NodeId> {
        self.activations.borrow().clone()
    }

    pub fn dispatched(&self) -> Vec<(NodeId, SyntheticEvent)> {
        self.dispatched.borrow().clone()
    }

    pub fn marker(&self) -> bool {
        self.marker.get()
    }

    pub fn marker_history(&self) -> Vec<bool> {
        self.marker_history.borrow().clone()
    }

    pub fn document_watches(&self) -> usize {
        self.document_watches.get()
    }

    pub fn input_watches(&self) -> usize {
        self.input_watches.get()
    }

    pub fn has_listeners(&self) -> bool {
        self.document_sink.borrow().is_some() || self.input_sink.borrow().is_some()
    }

    // =============================================================
    // User simulation
    // =============================================================

    /// Press the live box at `index`. The box intercepts the click, so the
    /// document listener never sees it.
    pub fn press_box(&self, index: usize) -> bool {
        let handler = self
            .picks
            .borrow()
            .iter()
            .find(|(id, i, _)| *i == index && self.is_attached(*id))
            .map(|(_, _, handler)| handler.clone());
        match handler {
            Some(handler) => {
                handler(index);
                true
            }
            None => false,
        }
    }

    /// Press `key` while the live box at `index` has focus. Only activation
    /// keys are intercepted, as the browser listener does.
    pub fn press_key(&self, index: usize, key: &str) -> bool {
        if !is_activation_key(key) {
            return false;
        }
        self.press_box(index)
    }

    /// Type characters into the live input.
    pub fn type_text(&self, text: &str) {
        let Some(id) = self.find_input() else {
            return;
        };
        self.with_node(id, |n| {
            if n.tag == Tag::Editable {
                n.text.push_str(text);
            } else {
                n.value.push_str(text);
            }
        });
        self.notify_input(id, PageSignal::InputActivity);
    }

    /// A real user click on `id`.
    pub fn click(&self, id: NodeId) {
        self.activate(&id);
    }

    fn notify_input(&self, id: NodeId, signal: PageSignal) {
        let sink = match &*self.input_sink.borrow() {
            Some((watched, sink)) if *watched == id && self.is_attached(id) => Some(sink.clone()),
            _ => None,
        };
        if let Some(sink) = sink {
            sink(signal);
        }
    }

    fn notify_document(&self, signal: PageSignal) {
        let sink = self.document_sink.borrow().clone();
        if let Some(sink) = sink {
            sink(signal);
        }
    }

    fn submit_form(&self) {
        let content = self.input_content().unwrap_or_default();
        self.submissions.borrow_mut().push(content);
        if let Some(input) = self.find_input() {
            self.notify_input(input, PageSignal::FormSubmitted);
        }
    }
}

impl Page for FakePage {
    type Node = NodeId;

    fn find_input(&self) -> Option<NodeId> {
        self.first(Self::is_input)
    }

    fn input_kind(&self, input: &NodeId) -> InputKind {
        match self.node(*input).tag {
            Tag::TextArea => InputKind::TextArea,
            Tag::TextInput => InputKind::TextInput,
            Tag::Editable => InputKind::ContentEditable,
            _ => InputKind::Unsupported,
        }
    }

    fn input_container(&self, input: &NodeId) -> Option<NodeId> {
        let ancestors = self.ancestors(*input);
        let rank = |id: &NodeId| {
            let node = self.node(*id);
            container_match(node.tag.name(), Some(&node.class))
        };
        ancestors
            .iter()
            .find(|id| rank(id) == Some(crate::contract::ContainerMatch::Named))
            .or_else(|| ancestors.iter().find(|id| rank(id).is_some()))
            .copied()
    }

    fn find_submit(&self) -> Option<NodeId> {
        self.first(Self::is_submit)
    }

    fn find_nav_control(&self) -> Option<NodeId> {
        self.first(|n| n.aria_label.as_deref().is_some_and(is_nav_control_label))
    }

    fn find_backdrop(&self) -> Option<NodeId> {
        self.first(|n| is_widget_backdrop_class(&n.class))
    }

    fn find_overlay(&self) -> Option<NodeId> {
        self.first(|n| n.class.split_whitespace().any(|c| c == OVERLAY_CLASS))
    }

    fn viewport_width(&self) -> f64 {
        self.width.get()
    }

    fn write_value(&self, input: &NodeId, text: &str) -> Result<(), PageError> {
        if !self.is_attached(*input) {
            return Err(PageError::Detached);
        }
        if !matches!(self.node(*input).tag, Tag::TextArea | Tag::TextInput) {
            return Err(PageError::WrongElement("value control"));
        }
        self.with_node(*input, |n| n.value = text.to_owned());
        Ok(())
    }

    fn write_text_content(&self, input: &NodeId, text: &str) {
        self.with_node(*input, |n| n.text = text.to_owned());
    }

    fn dispatch(&self, node: &NodeId, event: SyntheticEvent) -> Result<(), PageError> {
        if !self.is_attached(*node) {
            return Err(PageError::Detached);
        }
        self.dispatched.borrow_mut().push((*node, event));
        if event == SyntheticEvent::Input {
            self.notify_input(*node, PageSignal::InputActivity);
        }
        Ok(())
    }

    fn activate(&self, node: &NodeId) {
        if !self.is_attached(*node) {
            return;
        }
        self.activations.borrow_mut().push(*node);
        let fake = self.node(*node);
        if Self::is_submit(&fake) {
            self.submit_form();
        }
        let target = ClickTarget {
            text: Some(self.text_content(*node)),
            aria_label: fake.aria_label.clone(),
            within_send_control: Self::is_submit(&fake)
                || self.ancestors(*node).into_iter().any(|a| Self::is_submit(&self.node(a))),
        };
        self.notify_document(PageSignal::Click(target));
    }

    fn request_form_submit(&self, input: &NodeId) -> Result<bool, PageError> {
        let has_form = self.ancestors(*input).into_iter().any(|a| self.node(a).tag == Tag::Form);
        if !has_form {
            return Ok(false);
        }
        self.submit_form();
        Ok(true)
    }

    fn mount_overlay(&self, anchor: &NodeId, blueprint: &OverlayBlueprint, on_pick: PickHandler) -> Result<NodeId, PageError> {
        if !self.is_attached(*anchor) {
            return Err(PageError::Detached);
        }
        let Some(parent) = self.node(*anchor).parent else {
            return Err(PageError::Detached);
        };
        let overlay = self.append(parent, Tag::Div, blueprint.wrapper_class);
        let container = self.append(overlay, Tag::Div, blueprint.container_class);
        let mut picks = Vec::new();
        for item in &blueprint.boxes {
            let tile = self.append(container, Tag::Div, blueprint.box_class);
            self.with_node(tile, |n| {
                n.role = Some(blueprint.box_role.to_owned());
                n.tabindex = Some(blueprint.box_tabindex);
            });
            let icon = self.append(tile, Tag::Span, blueprint.icon_class);
            self.set_text(icon, &item.icon);
            let text = self.append(tile, Tag::P, blueprint.text_class);
            self.set_text(text, &item.text);
            picks.push((tile, item.index, on_pick.clone()));
        }
        // Move the overlay from the end of the parent to just before the anchor.
        let mut nodes = self.nodes.borrow_mut();
        let children = &mut nodes[parent.0].children;
        children.retain(|c| *c != overlay);
        let pos = children.iter().position(|c| c == anchor).unwrap_or(children.len());
        children.insert(pos, overlay);
        drop(nodes);
        self.picks.borrow_mut().extend(picks);
        Ok(overlay)
    }

    fn remove(&self, node: &NodeId) {
        self.detach(*node);
    }

    fn set_interaction_marker(&self, active: bool) {
        self.marker.set(active);
        self.marker_history.borrow_mut().push(active);
    }

    fn watch_document(&self, sink: SignalSink) {
        self.document_watches.set(self.document_watches.get() + 1);
        *self.document_sink.borrow_mut() = Some(sink);
    }

    fn watch_input(&self, sink: SignalSink) -> bool {
        let Some(input) = self.find_input() else {
            *self.input_sink.borrow_mut() = None;
            return false;
        };
        self.input_watches.set(self.input_watches.get() + 1);
        *self.input_sink.borrow_mut() = Some((input, sink));
        true
    }

    fn unwatch(&self) {
        *self.document_sink.borrow_mut() = None;
        *self.input_sink.borrow_mut() = None;
    }
}
