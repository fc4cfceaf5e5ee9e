//! Ready-made simulated controller.
//!
//! [`SimBuilder`] registers scripted views backed by the in-memory loader and
//! host, and [`Sim`] bundles the resulting controller with the shared
//! journal and parked-token queue.

use std::time::Duration;

use viewstage_core::{
    ControllerConfig, InstanceId, Payload, View, ViewController, ViewError, ViewId, ViewState,
};

use crate::{
    scripted::{Hook, Journal, Parked, Script, ScriptedView, Timing, TimingPlan},
    sim_host::{SimHost, SimLoader},
};

/// Controller over the simulated collaborators.
pub type SimController = ViewController<SimLoader, SimHost>;

/// Frame length used by [`Sim::tick`].
pub const FRAME: Duration = Duration::from_millis(16);

/// Resource path the builder registers for `view`.
pub fn resource_path(view: &str) -> String {
    format!("views/{view}")
}

/// Builder for a [`Sim`].
#[derive(Debug)]
pub struct SimBuilder {
    views: Vec<String>,
    bare: Vec<String>,
    missing: Vec<String>,
    plan: TimingPlan,
    parent: Option<String>,
    start: Option<String>,
    debug: bool,
}

impl Default for SimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBuilder {
    /// No views, immediate timing, no parent.
    pub fn new() -> Self {
        Self {
            views: Vec::new(),
            bare: Vec::new(),
            missing: Vec::new(),
            plan: TimingPlan::Fixed(Timing::Immediate),
            parent: None,
            start: None,
            debug: false,
        }
    }

    /// Register a scripted view.
    #[must_use]
    pub fn view(mut self, id: impl Into<String>) -> Self {
        self.views.push(id.into());
        self
    }

    /// Register several scripted views.
    #[must_use]
    pub fn views<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.views.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Register a view whose resource has no view component.
    #[must_use]
    pub fn bare_view(mut self, id: impl Into<String>) -> Self {
        self.bare.push(id.into());
        self
    }

    /// Register a view whose resource cannot be loaded.
    #[must_use]
    pub fn missing_view(mut self, id: impl Into<String>) -> Self {
        self.missing.push(id.into());
        self
    }

    /// Use the same timing for every instance.
    #[must_use]
    pub fn timing(mut self, timing: Timing) -> Self {
        self.plan = TimingPlan::Fixed(timing);
        self
    }

    /// Draw timing per instance from a seeded RNG.
    #[must_use]
    pub fn seeded(mut self, seed: u64, max_ticks: u32) -> Self {
        self.plan = TimingPlan::seeded(seed, max_ticks);
        self
    }

    /// Parent views under a named container.
    #[must_use]
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Configured starting location.
    #[must_use]
    pub fn start(mut self, id: impl Into<String>) -> Self {
        self.start = Some(id.into());
        self
    }

    /// Log lifecycle activity at `info`.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the controller. Does not run `setup`.
    pub fn build(self) -> Sim {
        let journal = Journal::default();
        let parked = Parked::default();

        let mut config = ControllerConfig::new().with_debug(self.debug);
        let mut loader = SimLoader::default();
        let mut host = SimHost::new();

        // Each view type draws its timing from its own stream.
        for (offset, id) in self.views.iter().enumerate() {
            let path = resource_path(id);
            config = config.with_view(id.as_str(), path.as_str());
            loader.add(path.as_str());

            let mut plan = match &self.plan {
                TimingPlan::Seeded { rng, max_ticks } => {
                    let mut rng = rng.clone();
                    rng.set_stream(offset as u64);
                    TimingPlan::Seeded { rng, max_ticks: *max_ticks }
                },
                fixed @ TimingPlan::Fixed(_) => fixed.clone(),
            };
            let journal = Journal::clone(&journal);
            let parked = Parked::clone(&parked);
            host.register(
                path,
                Box::new(move || {
                    let view: Box<dyn View> = Box::new(ScriptedView::new(
                        plan.next_timing(),
                        Journal::clone(&journal),
                        Parked::clone(&parked),
                    ));
                    Some(view)
                }),
            );
        }

        for id in &self.bare {
            let path = resource_path(id);
            config = config.with_view(id.as_str(), path.as_str());
            loader.add(path);
        }

        for id in &self.missing {
            config = config.with_view(id.as_str(), resource_path(id));
        }

        if let Some(start) = self.start {
            config = config.with_starting_location(start);
        }

        let mut controller = ViewController::new(config, loader, host);
        controller.set_view_parent(self.parent);

        Sim { controller, journal, parked }
    }
}

/// Simulated controller plus the state its scripted views share.
#[derive(Debug)]
pub struct Sim {
    /// Controller under test.
    pub controller: SimController,
    /// Hook calls of every scripted view.
    pub journal: Journal,
    /// Tokens parked by manually timed views.
    pub parked: Parked,
}

impl Sim {
    /// Advance one frame.
    ///
    /// # Errors
    /// Propagates controller errors raised by view actions.
    pub fn tick(&mut self) -> Result<(), ViewError> {
        self.controller.tick(FRAME)
    }

    /// Redeem every parked token in parking order, including tokens parked
    /// while redeeming. Returns how many were accepted.
    ///
    /// # Errors
    /// Propagates controller errors raised while completing.
    pub fn complete_parked(&mut self) -> Result<usize, ViewError> {
        let mut accepted = 0;
        loop {
            let batch: Vec<_> = self.parked.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                return Ok(accepted);
            }
            for token in batch {
                if self.controller.complete(token)? {
                    accepted += 1;
                }
            }
        }
    }

    /// Tick and redeem parked tokens until no transition is outstanding, for
    /// at most `max_ticks` frames. Returns true if the controller settled.
    ///
    /// # Errors
    /// Propagates controller errors.
    pub fn settle(&mut self, max_ticks: usize) -> Result<bool, ViewError> {
        for _ in 0..max_ticks {
            self.complete_parked()?;
            if self.is_settled() {
                return Ok(true);
            }
            self.tick()?;
        }
        self.complete_parked()?;
        Ok(self.is_settled())
    }

    /// True when nothing is queued and every live instance is `Active`.
    pub fn is_settled(&self) -> bool {
        let controller = &self.controller;
        if controller.target_location().is_some() || controller.target_overlay().is_some() {
            return false;
        }

        let current = controller.current_location();
        let overlays = controller.showing_overlays();
        let tracked = overlays.len() + usize::from(current.is_some());

        tracked == controller.live_instances()
            && current.iter().chain(overlays.iter()).all(|info| info.state == ViewState::Active)
    }

    /// Deliver a script to a live instance.
    ///
    /// # Errors
    /// `UnknownInstance`, or errors from the navigation it triggers.
    pub fn script(&mut self, instance: InstanceId, script: Script) -> Result<(), ViewError> {
        self.controller.send(instance, &Payload::new(script))
    }

    /// Current location's view, if any.
    pub fn current_view(&self) -> Option<ViewId> {
        self.controller.current_location().map(|info| info.view)
    }

    /// Views of the open overlays, oldest first.
    pub fn overlay_views(&self) -> Vec<ViewId> {
        self.controller.showing_overlays().into_iter().map(|info| info.view).collect()
    }

    /// Newest open overlay.
    pub fn newest_overlay(&self) -> Option<InstanceId> {
        self.controller.showing_overlays().last().map(|info| info.id)
    }

    /// Hooks recorded for `view`, in call order.
    pub fn hooks_for(&self, view: &str) -> Vec<Hook> {
        self.journal
            .borrow()
            .iter()
            .filter(|entry| entry.view == view)
            .map(|entry| entry.hook)
            .collect()
    }
}
