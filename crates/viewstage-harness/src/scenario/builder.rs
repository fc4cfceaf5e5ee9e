//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the oracle pattern.

use viewstage_core::{Payload, WaitFor};

use crate::{
    scenario::{OracleFn, World},
    scripted::{Script, Timing},
    sim::{Sim, SimBuilder},
};

/// Frames a `Settle` step may take before the scenario fails.
const SETTLE_LIMIT: usize = 256;

/// Instance a scripted message is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The current location.
    Location,
    /// The newest open overlay.
    NewestOverlay,
}

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Host-initiated location change.
    ChangeLocation {
        /// Target view.
        view: String,
        /// Skip waiting for the current location to hide.
        immediate: bool,
    },
    /// Host-initiated overlay open.
    OpenOverlay {
        /// Overlay view.
        view: String,
    },
    /// Host-initiated close of every overlay of a view.
    CloseOverlay {
        /// Overlay view.
        view: String,
    },
    /// Self-service navigation performed by a view.
    Script {
        /// Receiving instance.
        target: Target,
        /// What it does.
        script: Script,
    },
    /// Advance this many frames.
    Tick(usize),
    /// Redeem every parked token.
    CompleteParked,
    /// Run until nothing is outstanding.
    Settle,
}

/// Scenario builder.
///
/// Register views, configure timing, and list steps. Must call `.oracle()` to
/// get a [`RunnableScenario`] that can be executed.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    sim: SimBuilder,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), sim: SimBuilder::new(), steps: Vec::new() }
    }

    /// Register scripted views.
    #[must_use]
    pub fn views<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.sim = self.sim.views(ids);
        self
    }

    /// Register a view without a view component.
    #[must_use]
    pub fn bare_view(mut self, id: impl Into<String>) -> Self {
        self.sim = self.sim.bare_view(id);
        self
    }

    /// Use the same transition timing for every view.
    #[must_use]
    pub fn timing(mut self, timing: Timing) -> Self {
        self.sim = self.sim.timing(timing);
        self
    }

    /// Draw transition timing from a seeded RNG.
    #[must_use]
    pub fn seeded(mut self, seed: u64, max_ticks: u32) -> Self {
        self.sim = self.sim.seeded(seed, max_ticks);
        self
    }

    /// Parent views under a named container.
    #[must_use]
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.sim = self.sim.parent(name);
        self
    }

    /// Location shown by `setup`.
    #[must_use]
    pub fn start(mut self, view: impl Into<String>) -> Self {
        self.sim = self.sim.start(view);
        self
    }

    /// Append a step.
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Host changes the location, waiting for the current one to hide.
    #[must_use]
    pub fn change_location(self, view: impl Into<String>) -> Self {
        self.step(Step::ChangeLocation { view: view.into(), immediate: false })
    }

    /// Host changes the location without waiting.
    #[must_use]
    pub fn change_location_immediate(self, view: impl Into<String>) -> Self {
        self.step(Step::ChangeLocation { view: view.into(), immediate: true })
    }

    /// Host opens an overlay.
    #[must_use]
    pub fn open_overlay(self, view: impl Into<String>) -> Self {
        self.step(Step::OpenOverlay { view: view.into() })
    }

    /// Host closes every overlay of a view.
    #[must_use]
    pub fn close_overlay(self, view: impl Into<String>) -> Self {
        self.step(Step::CloseOverlay { view: view.into() })
    }

    /// The current location performs `script`.
    #[must_use]
    pub fn location_does(self, script: Script) -> Self {
        self.step(Step::Script { target: Target::Location, script })
    }

    /// The newest overlay performs `script`.
    #[must_use]
    pub fn overlay_does(self, script: Script) -> Self {
        self.step(Step::Script { target: Target::NewestOverlay, script })
    }

    /// Advance `frames` frames.
    #[must_use]
    pub fn tick(self, frames: usize) -> Self {
        self.step(Step::Tick(frames))
    }

    /// Redeem parked tokens.
    #[must_use]
    pub fn complete_parked(self) -> Self {
        self.step(Step::CompleteParked)
    }

    /// Run until nothing is outstanding.
    #[must_use]
    pub fn settle(self) -> Self {
        self.step(Step::Settle)
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Builds the simulated controller, runs `setup`, executes every step in
    /// order, then hands the final world to the oracle.
    pub fn run(self) -> Result<(), String> {
        let Scenario { name, sim, steps } = self.scenario;
        let mut sim = sim.build();

        sim.controller
            .setup(None)
            .map_err(|err| format!("Scenario '{name}': setup failed: {err}"))?;

        for (index, step) in steps.into_iter().enumerate() {
            let label = format!("{step:?}");
            execute(&mut sim, step)
                .map_err(|err| format!("Scenario '{name}': step {index} ({label}) failed: {err}"))?;
        }

        let world = World::new(sim);
        (self.oracle)(&world).map_err(|err| format!("Scenario '{name}': oracle failed: {err}"))
    }
}

fn execute(sim: &mut Sim, step: Step) -> Result<(), String> {
    let result = match step {
        Step::ChangeLocation { view, immediate } => {
            sim.controller.change_location(view, Payload::none(), immediate)
        },
        Step::OpenOverlay { view } => sim
            .controller
            .open_overlay(view, Payload::none(), WaitFor::Nothing)
            .map(|_| ()),
        Step::CloseOverlay { view } => sim.controller.close_overlay(view),
        Step::Script { target, script } => {
            let instance = match target {
                Target::Location => sim.controller.current_location().map(|info| info.id),
                Target::NewestOverlay => sim.newest_overlay(),
            };
            let instance = instance.ok_or_else(|| format!("no instance for {target:?}"))?;
            sim.script(instance, script)
        },
        Step::Tick(frames) => (0..frames).try_for_each(|_| sim.tick()),
        Step::CompleteParked => sim.complete_parked().map(|_| ()),
        Step::Settle => match sim.settle(SETTLE_LIMIT) {
            Ok(true) => Ok(()),
            Ok(false) => return Err(format!("not settled after {SETTLE_LIMIT} frames")),
            Err(err) => Err(err),
        },
    };
    result.map_err(|err| err.to_string())
}
