//! Visibility state machine for the recommendation overlay.
//!
//! The machine owns two flags: whether recommendations should be shown, and
//! whether the conversation has started. The overlay is mounted exactly when
//! [`VisibilityState::overlay_wanted`] holds. Transitions are driven only by
//! the four [`Event`]s; everything they ask the outside world to do is
//! returned as [`Command`]s so the table stays free of DOM and timer concerns.
//!
//! | Event | `show` | `has_messages` | Commands |
//! |-------|--------|----------------|----------|
//! | `RecommendationClicked(t)` | false | true | `SendMessage(t)` |
//! | `OrganicInputDetected` (only while shown) | false | true | none |
//! | `MessageSubmitted` | false | true | none |
//! | `NewConversationDetected` | later true | false | `RestoreRecommendations`, `DismissMobileNav` |

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

/// Coarse phase derived from `show_recommendations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Recommendations may be offered.
    Idle,
    /// The user is engaged; recommendations are hidden.
    Active,
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A recommendation box was pressed; carries the prompt to send.
    RecommendationClicked(String),
    /// A keystroke or composition event landed in the widget input.
    OrganicInputDetected,
    /// The widget form was submitted or its send button activated.
    MessageSubmitted,
    /// Something labelled "new chat" was clicked.
    NewConversationDetected,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run an injection sequence for this text.
    SendMessage(String),
    /// After the reset delay, call [`VisibilityState::restore_recommendations`].
    RestoreRecommendations,
    /// After the dismiss delay, close the mobile navigation if the viewport is narrow.
    DismissMobileNav,
}

/// Locally owned view of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityState {
    pub show_recommendations: bool,
    pub has_messages: bool,
}

impl Default for VisibilityState {
    fn default() -> Self {
        Self { show_recommendations: true, has_messages: false }
    }
}

impl VisibilityState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.show_recommendations { Phase::Idle } else { Phase::Active }
    }

    /// Whether the overlay must be present in the page right now.
    #[must_use]
    pub fn overlay_wanted(&self) -> bool {
        self.show_recommendations && !self.has_messages
    }

    /// Apply one event and return the commands it produces.
    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::RecommendationClicked(text) => {
                self.engage();
                vec![Command::SendMessage(text)]
            }
            Event::OrganicInputDetected => {
                if self.show_recommendations {
                    self.engage();
                }
                Vec::new()
            }
            Event::MessageSubmitted => {
                self.engage();
                Vec::new()
            }
            Event::NewConversationDetected => {
                self.has_messages = false;
                vec![Command::RestoreRecommendations, Command::DismissMobileNav]
            }
        }
    }

    /// Second half of the new-conversation reset, run once the widget has
    /// finished its own reset. Returns whether the state changed.
    ///
    /// A message submitted during the delay wins: recommendations are never
    /// shown while `has_messages` is set.
    pub fn restore_recommendations(&mut self) -> bool {
        if self.has_messages || self.show_recommendations {
            return false;
        }
        self.show_recommendations = true;
        true
    }

    fn engage(&mut self) {
        self.show_recommendations = false;
        self.has_messages = true;
    }
}
