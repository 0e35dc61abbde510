//! Advisory "programmatic interaction in progress" signal.
//!
//! Shared explicitly between the injection bridge and every listener that
//! must not react to the focus and input churn an injection causes. The guard
//! is counted so overlapping injections only clear it once the last one
//! finishes. Its active/inactive edges are mirrored onto the document for
//! consumers that can only see markup.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::page::Page;

#[derive(Debug, Clone, Default)]
pub struct InteractionGuard {
    depth: Rc<Cell<usize>>,
}

impl InteractionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }

    pub fn acquire<P: Page>(&self, page: &P) {
        let depth = self.depth.get();
        self.depth.set(depth + 1);
        if depth == 0 {
            page.set_interaction_marker(true);
        }
    }

    /// Release one hold. Releasing an inactive guard does nothing.
    pub fn release<P: Page>(&self, page: &P) {
        match self.depth.get() {
            0 => {}
            1 => {
                self.depth.set(0);
                page.set_interaction_marker(false);
            }
            n => self.depth.set(n - 1),
        }
    }

    /// Drop every hold at once.
    pub fn reset<P: Page>(&self, page: &P) {
        if self.depth.replace(0) > 0 {
            page.set_interaction_marker(false);
        }
    }
}
