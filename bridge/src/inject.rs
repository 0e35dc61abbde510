//! Message injection: make the widget behave as if the user typed and sent text.
//!
//! An [`Injection`] is a small step machine driven by chained timers:
//!
//! 1. `begin` raises the interaction guard and asks for the settle delay.
//! 2. `Fill` resolves the input and writes the text through the native value
//!    setter (or text content for an editable region), then dispatches
//!    `input`/`change`. The input is never focused, so no on-screen keyboard
//!    appears.
//! 3. `Submit` activates the send button, or requests submission of the
//!    input's enclosing form.
//! 4. `Release` lowers the guard.
//!
//! No target is cached between steps. If the input cannot be resolved at
//! `Fill`, the guard is released at once and the sequence ends silently.

#[cfg(test)]
#[path = "inject_test.rs"]
mod inject_test;

use std::time::Duration;

use crate::guard::InteractionGuard;
use crate::page::{InputKind, Page, SyntheticEvent};
use crate::timing::Timings;

/// How the message was finally sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitVia {
    Button,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionOutcome {
    Submitted(SubmitVia),
    /// Text was written but nothing accepted the submission.
    NoSubmitTarget,
    /// The widget input was not mounted; nothing happened.
    NoInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Fill,
    Submit,
    Release,
}

/// What the driver should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Schedule the next step after this delay.
    Wait(Duration),
    Finished(InjectionOutcome),
}

#[derive(Debug, Clone)]
pub struct Injection {
    text: String,
    step: Step,
    outcome: InjectionOutcome,
    timings: Timings,
}

impl Injection {
    /// Raise the guard and return the sequence with its first delay.
    pub fn begin<P: Page>(text: impl Into<String>, page: &P, guard: &InteractionGuard, timings: Timings) -> (Self, Duration) {
        guard.acquire(page);
        let injection = Self {
            text: text.into(),
            step: Step::Fill,
            outcome: InjectionOutcome::NoSubmitTarget,
            timings,
        };
        (injection, timings.settle)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Run the current step.
    pub fn advance<P: Page>(&mut self, page: &P, guard: &InteractionGuard) -> Progress {
        match self.step {
            Step::Fill => {
                let Some(input) = page.find_input() else {
                    log::debug!("inject: no input; giving up");
                    guard.release(page);
                    return Progress::Finished(InjectionOutcome::NoInput);
                };
                fill(page, &input, &self.text);
                self.step = Step::Submit;
                Progress::Wait(self.timings.submit)
            }
            Step::Submit => {
                self.outcome = submit(page);
                self.step = Step::Release;
                Progress::Wait(self.timings.release)
            }
            Step::Release => {
                guard.release(page);
                log::debug!("inject: finished with {:?}", self.outcome);
                Progress::Finished(self.outcome)
            }
        }
    }
}

fn fill<P: Page>(page: &P, input: &P::Node, text: &str) {
    let events: &[SyntheticEvent] = match page.input_kind(input) {
        InputKind::TextArea | InputKind::TextInput => {
            if let Err(err) = page.write_value(input, text) {
                log::debug!("inject: value write failed: {err}");
            }
            &[SyntheticEvent::Input, SyntheticEvent::Change]
        }
        InputKind::ContentEditable => {
            page.write_text_content(input, text);
            &[SyntheticEvent::Input]
        }
        InputKind::Unsupported => {
            log::debug!("inject: input accepts no text");
            &[]
        }
    };
    for event in events {
        if let Err(err) = page.dispatch(input, *event) {
            log::debug!("inject: dispatch {} failed: {err}", event.name());
        }
    }
}

fn submit<P: Page>(page: &P) -> InjectionOutcome {
    if let Some(button) = page.find_submit() {
        page.activate(&button);
        return InjectionOutcome::Submitted(SubmitVia::Button);
    }
    // Re-resolve: the widget may have re-rendered since the fill step.
    let Some(input) = page.find_input() else {
        return InjectionOutcome::NoSubmitTarget;
    };
    match page.request_form_submit(&input) {
        Ok(true) => InjectionOutcome::Submitted(SubmitVia::Form),
        Ok(false) => InjectionOutcome::NoSubmitTarget,
        Err(err) => {
            log::debug!("inject: form submit failed: {err}");
            InjectionOutcome::NoSubmitTarget
        }
    }
}
