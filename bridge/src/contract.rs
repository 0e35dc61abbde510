//! Selector contract with the externally rendered chat widget.
//!
//! The widget publishes no API, so every assumption about its markup lives
//! here: the CSS selectors used to resolve its input, submit button and
//! navigation chrome, and the textual heuristics applied to click targets.
//! When the widget's markup changes, this is the one module to update, and
//! [`CONTRACT_VERSION`] is bumped with it.

#[cfg(test)]
#[path = "contract_test.rs"]
mod contract_test;

use crate::state::Event;

/// Revision of the assumptions encoded in this module.
pub const CONTRACT_VERSION: u32 = 1;

// ── Widget selectors ────────────────────────────────────────────

/// The widget's text input: first textarea, text input, or editable region.
pub const INPUT_SELECTOR: &str = r#"textarea, input[type="text"], [contenteditable="true"]"#;

/// The widget's send affordance.
pub const SUBMIT_SELECTOR: &str = r#"button[type="submit"], button[aria-label*="send" i]"#;

/// Ancestors named like a layout container, preferred as the overlay anchor.
pub const NAMED_CONTAINER_SELECTOR: &str = r#"[class*="container" i], [class*="wrapper" i]"#;

/// Structural fallback anchor when no named container encloses the input.
pub const STRUCTURAL_CONTAINER_SELECTOR: &str = "form, div";

/// Explicit menu or close control of the mobile navigation drawer.
pub const NAV_CONTROL_SELECTOR: &str = r#"[aria-label*="menu" i], [aria-label*="close" i]"#;

/// Generic backdrop behind the mobile navigation drawer, never our own overlay.
pub const BACKDROP_SELECTOR: &str = r#"[class*="backdrop" i]:not(.recommendations-overlay), [class*="overlay" i]:not(.recommendations-overlay)"#;

// ── Locally owned markup ────────────────────────────────────────

/// Marker class of the overlay root; presence checks look this up.
pub const OVERLAY_CLASS: &str = "recommendations-overlay";
pub const OVERLAY_CONTAINER_CLASS: &str = "recommendations-container";
pub const BOX_CLASS: &str = "recommendation-box";
pub const ICON_CLASS: &str = "recommendation-icon";
pub const TEXT_CLASS: &str = "recommendation-text";

/// Document attribute mirrored from the interaction guard.
pub const INTERACTION_FLAG_ATTR: &str = "data-programmatic-interaction";

const NEW_CHAT_PATTERN: &str = "new chat";
const SEND_PATTERN: &str = "send";

/// What a document-level click listener can observe about its target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    /// Text content of the clicked element.
    pub text: Option<String>,
    /// Its `aria-label`, if any.
    pub aria_label: Option<String>,
    /// Whether the element is, or sits inside, a node matching [`SUBMIT_SELECTOR`].
    pub within_send_control: bool,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Whether text or label announces a "new chat" action.
#[must_use]
pub fn is_new_chat(text: Option<&str>, aria_label: Option<&str>) -> bool {
    text.is_some_and(|t| contains_ci(t, NEW_CHAT_PATTERN))
        || aria_label.is_some_and(|l| contains_ci(l, NEW_CHAT_PATTERN))
}

/// Whether an accessible label reads as a send button.
#[must_use]
pub fn is_send_label(aria_label: &str) -> bool {
    contains_ci(aria_label, SEND_PATTERN)
}

/// Whether a button matches the submit affordance contract.
#[must_use]
pub fn is_submit_button(button_type: Option<&str>, aria_label: Option<&str>) -> bool {
    button_type.is_some_and(|t| t.eq_ignore_ascii_case("submit")) || aria_label.is_some_and(is_send_label)
}

/// How well an ancestor qualifies as the overlay anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContainerMatch {
    /// A `form` or `div` with no telling class name.
    Structural,
    /// A class name containing "container" or "wrapper".
    Named,
}

/// Classify a candidate ancestor by tag name and class attribute.
#[must_use]
pub fn container_match(tag: &str, class: Option<&str>) -> Option<ContainerMatch> {
    let named = class.is_some_and(|c| contains_ci(c, "container") || contains_ci(c, "wrapper"));
    if named {
        return Some(ContainerMatch::Named);
    }
    if tag.eq_ignore_ascii_case("form") || tag.eq_ignore_ascii_case("div") {
        return Some(ContainerMatch::Structural);
    }
    None
}

/// Whether a class attribute marks a navigation backdrop.
#[must_use]
pub fn is_backdrop_class(class: &str) -> bool {
    contains_ci(class, "backdrop") || contains_ci(class, "overlay")
}

/// Whether a class attribute marks a backdrop owned by the widget rather than
/// the recommendation overlay.
#[must_use]
pub fn is_widget_backdrop_class(class: &str) -> bool {
    is_backdrop_class(class) && !class.split_whitespace().any(|c| c == OVERLAY_CLASS)
}

/// Whether an accessible label marks a menu or close control.
#[must_use]
pub fn is_nav_control_label(aria_label: &str) -> bool {
    contains_ci(aria_label, "menu") || contains_ci(aria_label, "close")
}

/// Keys that activate a focused `role="button"` element.
#[must_use]
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " " | "Spacebar")
}

/// Map a document click to a state-machine event, if it means anything.
///
/// New-chat detection wins over send detection.
#[must_use]
pub fn classify_click(target: &ClickTarget) -> Option<Event> {
    if is_new_chat(target.text.as_deref(), target.aria_label.as_deref()) {
        return Some(Event::NewConversationDetected);
    }
    if target.within_send_control {
        return Some(Event::MessageSubmitted);
    }
    None
}
