//! Final state of a scenario run.

use viewstage_core::{ViewEvent, ViewId};

use crate::{
    scripted::{Hook, JournalEntry},
    sim::{Sim, SimController},
};

/// Controller, hook journal, and event log after the last step.
#[derive(Debug)]
pub struct World {
    sim: Sim,
    events: Vec<ViewEvent>,
}

impl World {
    /// Capture `sim`, draining its buffered events.
    pub fn new(mut sim: Sim) -> Self {
        let events = sim.controller.drain_events().collect();
        Self { sim, events }
    }

    /// Controller under test.
    pub fn controller(&self) -> &SimController {
        &self.sim.controller
    }

    /// Every event emitted during the run.
    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Events rendered one per entry, e.g. `ShowStart Title location`.
    pub fn event_log(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    /// Every hook call of every scripted view.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.sim.journal.borrow().clone()
    }

    /// Hooks recorded for `view`.
    pub fn hooks_for(&self, view: &str) -> Vec<Hook> {
        self.sim.hooks_for(view)
    }

    /// String payloads `view` was shown with.
    pub fn payloads_for(&self, view: &str) -> Vec<String> {
        self.sim
            .journal
            .borrow()
            .iter()
            .filter(|entry| entry.view == view)
            .filter_map(|entry| entry.payload.clone())
            .collect()
    }

    /// Current location's view.
    pub fn current_view(&self) -> Option<ViewId> {
        self.sim.current_view()
    }

    /// Open overlays' views, oldest first.
    pub fn overlay_views(&self) -> Vec<ViewId> {
        self.sim.overlay_views()
    }

    /// True when nothing is queued and every live view is active.
    pub fn is_settled(&self) -> bool {
        self.sim.is_settled()
    }

    /// Live instances of `view`.
    pub fn live_count(&self, view: &str) -> usize {
        let location = self.controller().current_location().filter(|info| info.view == view);
        let overlays = self.controller().showing_overlays();
        usize::from(location.is_some()) + overlays.iter().filter(|info| info.view == view).count()
    }
}
