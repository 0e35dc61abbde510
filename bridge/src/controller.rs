//! Wires the state machine to the page, the overlay and the injection bridge.
//!
//! ARCHITECTURE
//! ============
//! Page listeners feed [`PageSignal`]s in; they are classified into state
//! machine [`Event`]s; each transition re-synchronises the overlay (level
//! triggered) and runs the [`Command`]s it produced. Every deferred callback
//! is owned by a handle stored here, so a resync or [`Controller::dispose`]
//! cancels whatever was still pending. Callbacks hold only a weak reference
//! and become no-ops once the controller is gone.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::catalog::{RecommendationItem, text_at};
use crate::contract::{CONTRACT_VERSION, classify_click};
use crate::guard::InteractionGuard;
use crate::inject::{Injection, Progress};
use crate::overlay::{MountOutcome, OverlayManager};
use crate::page::{Page, PageSignal, PickHandler, SignalSink};
use crate::schedule::Scheduler;
use crate::state::{Command, Event, VisibilityState};
use crate::timing::{MOBILE_BREAKPOINT_PX, Timings};

/// Pending deferred callbacks, grouped by what cancels them.
struct Timers<H> {
    /// Overlay mount attempts; replaced on every state change.
    mount: Vec<H>,
    /// Input listener installation; replaced when visibility flips.
    monitor: Option<H>,
    /// New-conversation follow-ups.
    reset: Vec<H>,
    /// Next step of each in-flight injection, by sequence number.
    injections: HashMap<u64, H>,
}

impl<H> Default for Timers<H> {
    fn default() -> Self {
        Self { mount: Vec::new(), monitor: None, reset: Vec::new(), injections: HashMap::new() }
    }
}

struct Inner<P: Page, S: Scheduler> {
    page: P,
    scheduler: S,
    catalog: Vec<RecommendationItem>,
    timings: Timings,
    overlay: OverlayManager,
    guard: InteractionGuard,
    state: Cell<VisibilityState>,
    timers: RefCell<Timers<S::Handle>>,
    next_injection: Cell<u64>,
    mounted: Cell<bool>,
}

/// Owner of the whole overlay integration for one page.
pub struct Controller<P: Page + 'static, S: Scheduler + 'static> {
    inner: Rc<Inner<P, S>>,
}

impl<P: Page + 'static, S: Scheduler + 'static> Controller<P, S> {
    #[must_use]
    pub fn new(page: P, scheduler: S, catalog: &[RecommendationItem], timings: Timings) -> Self {
        let inner = Inner {
            page,
            scheduler,
            catalog: catalog.to_vec(),
            timings,
            overlay: OverlayManager::new(catalog),
            guard: InteractionGuard::new(),
            state: Cell::new(VisibilityState::new()),
            timers: RefCell::new(Timers::default()),
            next_injection: Cell::new(0),
            mounted: Cell::new(false),
        };
        Self { inner: Rc::new(inner) }
    }

    #[must_use]
    pub fn page(&self) -> &P {
        &self.inner.page
    }

    #[must_use]
    pub fn state(&self) -> VisibilityState {
        self.inner.state.get()
    }

    /// Start observing the page and schedule the first overlay attempts.
    /// Calling it again while mounted does nothing.
    pub fn mount(&self) {
        if self.inner.mounted.replace(true) {
            return;
        }
        log::debug!("controller: mounting against widget contract v{CONTRACT_VERSION}");
        self.inner.page.watch_document(self.inner.sink());
        self.inner.schedule_monitor();
        self.inner.resync_overlay();
    }

    /// Feed one event into the state machine.
    pub fn dispatch(&self, event: Event) {
        self.inner.dispatch(event);
    }

    /// Feed one raw page observation.
    pub fn signal(&self, signal: PageSignal) {
        self.inner.signal(signal);
    }

    /// Act as if the recommendation box at `index` was pressed.
    pub fn pick(&self, index: usize) {
        self.inner.pick(index);
    }

    /// Cancel everything pending, detach listeners, remove the overlay and
    /// release the guard.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl<P: Page + 'static, S: Scheduler + 'static> Drop for Controller<P, S> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl<P: Page + 'static, S: Scheduler + 'static> Inner<P, S> {
    fn sink(self: &Rc<Self>) -> SignalSink {
        let weak = Rc::downgrade(self);
        Rc::new(move |signal| {
            if let Some(inner) = weak.upgrade() {
                inner.signal(signal);
            }
        })
    }

    fn pick_handler(self: &Rc<Self>) -> PickHandler {
        let weak = Rc::downgrade(self);
        Rc::new(move |index| {
            if let Some(inner) = weak.upgrade() {
                inner.pick(index);
            }
        })
    }

    /// Schedule `task` against a weak reference to `self`.
    fn defer(self: &Rc<Self>, delay: std::time::Duration, task: impl FnOnce(&Rc<Self>) + 'static) -> S::Handle {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    task(&inner);
                }
            }),
        )
    }

    fn signal(self: &Rc<Self>, signal: PageSignal) {
        if !self.mounted.get() {
            return;
        }
        let event = match signal {
            // Clicks the bridge issues itself (submit, nav dismissal) bubble
            // to the document too; they must not re-enter the machine.
            PageSignal::Click(_) if self.guard.is_active() => {
                log::trace!("click during programmatic interaction ignored");
                None
            }
            PageSignal::Click(target) => classify_click(&target),
            PageSignal::InputActivity => {
                if self.guard.is_active() {
                    log::trace!("input activity during injection ignored");
                    None
                } else {
                    Some(Event::OrganicInputDetected)
                }
            }
            PageSignal::FormSubmitted => Some(Event::MessageSubmitted),
        };
        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    fn pick(self: &Rc<Self>, index: usize) {
        let Some(text) = text_at(&self.catalog, index) else {
            log::debug!("pick: no recommendation at {index}");
            return;
        };
        self.dispatch(Event::RecommendationClicked(text.to_owned()));
    }

    fn dispatch(self: &Rc<Self>, event: Event) {
        let before = self.state.get();
        let mut state = before;
        let commands = state.apply(event);
        self.state.set(state);
        if state != before {
            log::debug!("state: {before:?} -> {state:?} ({:?})", state.phase());
            self.on_state_changed(before);
        }
        for command in commands {
            self.run(command);
        }
    }

    fn on_state_changed(self: &Rc<Self>, before: VisibilityState) {
        self.resync_overlay();
        if before.show_recommendations != self.state.get().show_recommendations {
            self.schedule_monitor();
        }
    }

    fn run(self: &Rc<Self>, command: Command) {
        match command {
            Command::SendMessage(text) => self.start_injection(text),
            Command::RestoreRecommendations => {
                // A newer reset supersedes any follow-up still pending.
                let stale = std::mem::take(&mut self.timers.borrow_mut().reset);
                drop(stale);
                let handle = self.defer(self.timings.reset, |inner| {
                    let before = inner.state.get();
                    let mut state = before;
                    if state.restore_recommendations() {
                        inner.state.set(state);
                        log::debug!("state: {before:?} -> {state:?} (restored)");
                        inner.on_state_changed(before);
                    }
                });
                self.timers.borrow_mut().reset.push(handle);
            }
            Command::DismissMobileNav => {
                let handle = self.defer(self.timings.nav_dismiss, |inner| inner.dismiss_mobile_nav());
                self.timers.borrow_mut().reset.push(handle);
            }
        }
    }

    // --- Overlay ---

    /// Tear down at once if the overlay is unwanted; otherwise schedule the
    /// mount attempts. Pending attempts from earlier changes are cancelled.
    fn resync_overlay(self: &Rc<Self>) {
        let stale = std::mem::take(&mut self.timers.borrow_mut().mount);
        drop(stale);
        if !self.state.get().overlay_wanted() {
            self.overlay.teardown(&self.page);
            return;
        }
        let handles: Vec<S::Handle> = self
            .timings
            .mount
            .delays()
            .into_iter()
            .map(|delay| self.defer(delay, |inner| inner.attempt_mount()))
            .collect();
        self.timers.borrow_mut().mount = handles;
    }

    fn attempt_mount(self: &Rc<Self>) {
        let outcome = self.overlay.ensure_mounted(&self.page, self.state.get(), self.pick_handler());
        if outcome == MountOutcome::Failed {
            log::debug!("overlay attempt failed; next attempt may succeed");
        } else {
            log::trace!("overlay attempt: {outcome:?}");
        }
    }

    // --- Input monitoring ---

    fn schedule_monitor(self: &Rc<Self>) {
        let handle = self.defer(self.timings.input_monitor, |inner| {
            if !inner.page.watch_input(inner.sink()) {
                log::trace!("monitor: no input to watch yet");
            }
        });
        self.timers.borrow_mut().monitor = Some(handle);
    }

    // --- Injection ---

    fn start_injection(self: &Rc<Self>, text: String) {
        let id = self.next_injection.get();
        self.next_injection.set(id + 1);
        let (injection, delay) = Injection::begin(text, &self.page, &self.guard, self.timings);
        log::debug!("injection {id}: sending {:?}", injection.text());
        self.schedule_injection(id, injection, delay);
    }

    fn schedule_injection(self: &Rc<Self>, id: u64, mut injection: Injection, delay: std::time::Duration) {
        let handle = self.defer(delay, move |inner| match injection.advance(&inner.page, &inner.guard) {
            Progress::Wait(next) => inner.schedule_injection(id, injection, next),
            Progress::Finished(outcome) => {
                log::debug!("injection {id}: {outcome:?}");
                let done = inner.timers.borrow_mut().injections.remove(&id);
                drop(done);
            }
        });
        let replaced = self.timers.borrow_mut().injections.insert(id, handle);
        drop(replaced);
    }

    // --- Mobile navigation ---

    /// A drawer backdrop often wraps the sidebar, so its click carries the
    /// "New Chat" text; the guard keeps that click from starting another reset.
    fn dismiss_mobile_nav(&self) {
        if self.page.viewport_width() >= MOBILE_BREAKPOINT_PX {
            return;
        }
        let target = match self.page.find_nav_control() {
            Some(control) => {
                log::debug!("nav: closing via control");
                control
            }
            None => {
                let Some(backdrop) = self.page.find_backdrop() else {
                    return;
                };
                log::debug!("nav: closing via backdrop");
                backdrop
            }
        };
        self.guard.acquire(&self.page);
        self.page.activate(&target);
        self.guard.release(&self.page);
    }

    // --- Teardown ---

    fn dispose(&self) {
        if !self.mounted.replace(false) {
            // Never mounted: still honour the unconditional removal.
            self.overlay.teardown(&self.page);
            return;
        }
        let timers = std::mem::take(&mut *self.timers.borrow_mut());
        drop(timers);
        self.page.unwatch();
        self.overlay.teardown(&self.page);
        self.guard.reset(&self.page);
    }
}
