//! Recommendation overlay and message injection for a third-party chat widget.
//!
//! This crate is compiled to WebAssembly and runs in the browser next to a
//! chat widget it does not own. It keeps a locally owned view (the overlay,
//! and whether the conversation has started) in step with the widget using
//! only what the rendered page reveals: element presence and intercepted
//! events. All DOM access goes through the [`page::Page`] trait, so the core
//! runs and is tested natively against an in-memory page.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`state`] | Visibility state machine: events, transitions, commands |
//! | [`controller`] | Drives the machine from page signals; owns every timer |
//! | [`overlay`] | Overlay blueprint, idempotent mount and teardown |
//! | [`inject`] | Step machine that types and submits text on the user's behalf |
//! | [`guard`] | Advisory "programmatic interaction in progress" signal |
//! | [`contract`] | Versioned selector contract and textual heuristics |
//! | [`page`] | The DOM seam and its signal types |
//! | [`web`] | `web-sys` implementation of the page |
//! | [`listener`] | Self-detaching DOM event listener |
//! | [`schedule`] | Timer abstraction over browser timeouts |
//! | [`timing`] | Delays, retry backoff and the mobile breakpoint |
//! | [`catalog`] | Static recommendation catalog |

pub mod catalog;
pub mod contract;
pub mod controller;
pub mod guard;
pub mod inject;
pub mod listener;
pub mod overlay;
pub mod page;
pub mod schedule;
pub mod state;
pub mod timing;
pub mod web;

#[cfg(test)]
mod fake;

pub use controller::Controller;
pub use schedule::TimeoutScheduler;
pub use web::WebPage;

/// Controller wired to the live document and browser timers.
pub type BrowserController = Controller<WebPage, TimeoutScheduler>;
