//! View identity and lifecycle hooks.

use std::{borrow::Borrow, fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{context::ViewContext, instance::Transition, payload::Payload};

/// Registry key for a view.
///
/// Every instance created from a registration carries the same identifier,
/// so several overlays may share one `ViewId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ViewId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ViewId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ViewId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ViewId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ViewId> for ViewId {
    fn from(id: &ViewId) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for ViewId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ViewId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How the controller manages an instance. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// Occupies the single location slot.
    Location,
    /// Shown alongside the location; any number may coexist.
    Overlay,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location => f.write_str("location"),
            Self::Overlay => f.write_str("overlay"),
        }
    }
}

/// Lifecycle hooks for a concrete view.
///
/// Every hook has a default body, so a view only overrides what it needs.
/// Hooks talk back to the controller exclusively through the
/// [`ViewContext`] they are given.
///
/// [`on_show_start`](View::on_show_start) and
/// [`on_hide_start`](View::on_hide_start) receive a [`Transition`] that
/// must eventually be redeemed with [`ViewContext::complete`] (during this
/// hook or a later one) or with
/// [`ViewController::complete`](crate::ViewController::complete). The
/// defaults redeem it immediately.
pub trait View: fmt::Debug {
    /// Called once after the view is instantiated and parented, before it is
    /// shown.
    fn on_create(&mut self, _cx: &mut ViewContext) {}

    /// Called when the view starts transitioning in.
    fn on_show_start(&mut self, cx: &mut ViewContext, _payload: Payload, done: Transition) {
        cx.complete(done);
    }

    /// Called once the show transition has completed and the view is active.
    fn on_show_complete(&mut self, _cx: &mut ViewContext) {}

    /// Called when the view starts transitioning out.
    fn on_hide_start(&mut self, cx: &mut ViewContext, done: Transition) {
        cx.complete(done);
    }

    /// Called once the hide transition has completed, right before the view
    /// is destroyed. Also called when a showing view is re-shown and its
    /// outstanding transition is cut short.
    fn on_hide_complete(&mut self, _cx: &mut ViewContext) {}

    /// Called on every controller tick while the view is alive.
    fn on_update(&mut self, _cx: &mut ViewContext, _delta: Duration) {}

    /// Called when the host routes a message (input, button press, ...) to
    /// this view.
    fn on_message(&mut self, _cx: &mut ViewContext, _message: &Payload) {}

    /// Position among the visual parent's children.
    ///
    /// `parent_children` is the parent's child count including this view, or
    /// `None` when views are created without a parent. Locations go to the
    /// back and overlays to the front by default.
    fn sibling_index(&self, mode: DisplayMode, parent_children: Option<usize>) -> Option<usize> {
        let children = parent_children?;
        match mode {
            DisplayMode::Location => Some(0),
            DisplayMode::Overlay => Some(children.saturating_sub(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain;

    impl View for Plain {}

    #[test]
    fn default_sibling_index() {
        assert_eq!(Plain.sibling_index(DisplayMode::Location, None), None);
        assert_eq!(Plain.sibling_index(DisplayMode::Overlay, None), None);
        assert_eq!(Plain.sibling_index(DisplayMode::Location, Some(4)), Some(0));
        assert_eq!(Plain.sibling_index(DisplayMode::Overlay, Some(4)), Some(3));
    }

    #[test]
    fn view_id_comparisons() {
        let id = ViewId::new("Title");
        assert_eq!(id, "Title");
        assert_eq!(id.to_string(), "Title");
        assert_eq!(ViewId::from(&id), id);
    }
}
