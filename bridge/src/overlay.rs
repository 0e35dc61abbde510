//! Overlay lifecycle: build, insert and tear down the recommendation overlay.
//!
//! The overlay is a single subtree tagged with [`OVERLAY_CLASS`] and inserted
//! as the previous sibling of the widget's input container. At most one is
//! live; presence is always checked against the page, never remembered, so a
//! repeated attempt with unchanged state is a no-op and teardown removes an
//! overlay regardless of who created it.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::catalog::RecommendationItem;
use crate::contract::{BOX_CLASS, ICON_CLASS, OVERLAY_CLASS, OVERLAY_CONTAINER_CLASS, TEXT_CLASS};
use crate::page::{Page, PickHandler};
use crate::state::VisibilityState;

/// Markup for one pressable box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxBlueprint {
    pub index: usize,
    pub icon: String,
    pub text: String,
}

/// Everything a [`Page`] needs to build the overlay subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayBlueprint {
    pub wrapper_class: &'static str,
    pub container_class: &'static str,
    pub box_class: &'static str,
    pub icon_class: &'static str,
    pub text_class: &'static str,
    /// ARIA role given to every box.
    pub box_role: &'static str,
    /// `tabindex` given to every box.
    pub box_tabindex: i32,
    pub boxes: Vec<BoxBlueprint>,
}

impl OverlayBlueprint {
    #[must_use]
    pub fn from_catalog(catalog: &[RecommendationItem]) -> Self {
        Self {
            wrapper_class: OVERLAY_CLASS,
            container_class: OVERLAY_CONTAINER_CLASS,
            box_class: BOX_CLASS,
            icon_class: ICON_CLASS,
            text_class: TEXT_CLASS,
            box_role: "button",
            box_tabindex: 0,
            boxes: catalog
                .iter()
                .enumerate()
                .map(|(index, item)| BoxBlueprint {
                    index,
                    icon: item.icon.to_owned(),
                    text: item.text.to_owned(),
                })
                .collect(),
        }
    }
}

/// Result of one mount attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    AlreadyPresent,
    /// State says the overlay must be absent; any stray overlay was removed.
    NotWanted,
    /// No input resolved yet; retried by the next scheduled attempt.
    NoInput,
    /// The input has no usable container ancestor.
    NoAnchor,
    /// The page refused the insertion.
    Failed,
}

pub struct OverlayManager {
    blueprint: OverlayBlueprint,
}

impl OverlayManager {
    #[must_use]
    pub fn new(catalog: &[RecommendationItem]) -> Self {
        Self { blueprint: OverlayBlueprint::from_catalog(catalog) }
    }

    /// Mount the overlay if the state wants it and none is present.
    pub fn ensure_mounted<P: Page>(&self, page: &P, state: VisibilityState, on_pick: PickHandler) -> MountOutcome {
        if !state.overlay_wanted() {
            self.teardown(page);
            return MountOutcome::NotWanted;
        }
        if page.find_overlay().is_some() {
            return MountOutcome::AlreadyPresent;
        }
        let Some(input) = page.find_input() else {
            log::trace!("overlay: no input yet");
            return MountOutcome::NoInput;
        };
        let Some(anchor) = page.input_container(&input) else {
            log::trace!("overlay: input has no container");
            return MountOutcome::NoAnchor;
        };
        match page.mount_overlay(&anchor, &self.blueprint, on_pick) {
            Ok(_) => {
                log::debug!("overlay: mounted {} recommendations", self.blueprint.boxes.len());
                MountOutcome::Mounted
            }
            Err(err) => {
                log::debug!("overlay: mount failed: {err}");
                MountOutcome::Failed
            }
        }
    }

    /// Remove the overlay if one is present. Returns whether one was removed.
    pub fn teardown<P: Page>(&self, page: &P) -> bool {
        let Some(node) = page.find_overlay() else {
            return false;
        };
        page.remove(&node);
        log::debug!("overlay: removed");
        true
    }
}
