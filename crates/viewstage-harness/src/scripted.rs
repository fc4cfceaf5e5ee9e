//! Scripted views with controllable transition timing.
//!
//! A [`ScriptedView`] records every hook call into a shared [`Journal`],
//! finishes its transitions according to its [`Timing`], and reacts to
//! [`Script`] messages with self-service navigation. Timing can be fixed or
//! drawn per instance from a seeded RNG, so a failing run replays exactly.

use std::{cell::RefCell, rc::Rc, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use viewstage_core::{
    InstanceId, Payload, Phase, Transition, View, ViewContext, ViewId, WaitFor,
};

/// When a scripted view finishes its show and hide transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Complete inside the start hook.
    Immediate,
    /// Complete on the given controller tick after the start hook.
    Deferred {
        /// Ticks to wait; zero behaves like `Immediate`.
        ticks: u32,
    },
    /// Park the token in the shared [`Parked`] queue for the test to redeem.
    Manual,
}

/// Source of per-instance timing.
#[derive(Debug, Clone)]
pub enum TimingPlan {
    /// Every instance uses the same timing.
    Fixed(Timing),
    /// Each instance is immediate or deferred by up to `max_ticks`, drawn
    /// from a seeded RNG.
    Seeded {
        /// Generator state.
        rng: ChaCha8Rng,
        /// Upper bound for deferred ticks.
        max_ticks: u32,
    },
}

impl TimingPlan {
    /// Deterministic random timing.
    pub fn seeded(seed: u64, max_ticks: u32) -> Self {
        Self::Seeded { rng: ChaCha8Rng::seed_from_u64(seed), max_ticks }
    }

    /// Timing for the next instance.
    pub fn next_timing(&mut self) -> Timing {
        match self {
            Self::Fixed(timing) => *timing,
            Self::Seeded { rng, max_ticks } => match rng.gen_range(0..=*max_ticks) {
                0 => Timing::Immediate,
                ticks => Timing::Deferred { ticks },
            },
        }
    }
}

/// Hook invoked on a scripted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `on_create`
    Create,
    /// `on_show_start`
    ShowStart,
    /// `on_show_complete`
    ShowComplete,
    /// `on_hide_start`
    HideStart,
    /// `on_hide_complete`
    HideComplete,
}

/// One recorded hook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Instance the hook ran for.
    pub instance: InstanceId,
    /// View of the instance.
    pub view: ViewId,
    /// Hook that ran.
    pub hook: Hook,
    /// Show payload, when it was a `String`.
    pub payload: Option<String>,
}

/// Shared log of hook calls across all scripted views.
pub type Journal = Rc<RefCell<Vec<JournalEntry>>>;

/// Shared queue of tokens parked by [`Timing::Manual`] views.
pub type Parked = Rc<RefCell<Vec<Transition>>>;

/// Navigation a scripted view performs when it receives the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Change the location.
    ChangeLocation(ViewId),
    /// Change the location, passing a string payload.
    ChangeLocationWith(ViewId, String),
    /// Open an overlay.
    OpenOverlay(ViewId, WaitFor),
    /// Close every overlay of a view.
    CloseOverlay(ViewId),
    /// Close the receiving overlay.
    CloseSelf,
}

/// View driven by its timing and by [`Script`] messages.
#[derive(Debug)]
pub struct ScriptedView {
    timing: Timing,
    journal: Journal,
    parked: Parked,
    pending: Option<(Transition, u32)>,
}

impl ScriptedView {
    /// View with the given timing, recording into `journal`.
    pub fn new(timing: Timing, journal: Journal, parked: Parked) -> Self {
        Self { timing, journal, parked, pending: None }
    }

    /// Timing this view was built with.
    pub fn timing(&self) -> Timing {
        self.timing
    }

    fn record(&self, cx: &ViewContext, hook: Hook, payload: Option<String>) {
        self.journal.borrow_mut().push(JournalEntry {
            instance: cx.instance(),
            view: cx.view().clone(),
            hook,
            payload,
        });
    }

    fn start(&mut self, cx: &mut ViewContext, done: Transition) {
        match self.timing {
            Timing::Immediate | Timing::Deferred { ticks: 0 } => cx.complete(done),
            Timing::Deferred { ticks } => self.pending = Some((done, ticks)),
            Timing::Manual => self.parked.borrow_mut().push(done),
        }
    }
}

impl View for ScriptedView {
    fn on_create(&mut self, cx: &mut ViewContext) {
        self.record(cx, Hook::Create, None);
    }

    fn on_show_start(&mut self, cx: &mut ViewContext, payload: Payload, done: Transition) {
        self.record(cx, Hook::ShowStart, payload.take::<String>().ok());
        self.start(cx, done);
    }

    fn on_show_complete(&mut self, cx: &mut ViewContext) {
        self.record(cx, Hook::ShowComplete, None);
    }

    fn on_hide_start(&mut self, cx: &mut ViewContext, done: Transition) {
        // A deferred show still counting down is superseded by the hide.
        self.pending = None;
        self.record(cx, Hook::HideStart, None);
        self.start(cx, done);
    }

    fn on_hide_complete(&mut self, cx: &mut ViewContext) {
        if self.pending.is_some_and(|(done, _)| done.phase() == Phase::Show) {
            self.pending = None;
        }
        self.record(cx, Hook::HideComplete, None);
    }

    fn on_update(&mut self, cx: &mut ViewContext, _delta: Duration) {
        let Some((done, ticks)) = self.pending.take() else {
            return;
        };
        if ticks <= 1 {
            cx.complete(done);
        } else {
            self.pending = Some((done, ticks - 1));
        }
    }

    fn on_message(&mut self, cx: &mut ViewContext, message: &Payload) {
        let Some(script) = message.get::<Script>() else {
            return;
        };
        match script.clone() {
            Script::ChangeLocation(view) => cx.change_location(view, Payload::none()),
            Script::ChangeLocationWith(view, data) => cx.change_location(view, Payload::new(data)),
            Script::OpenOverlay(view, wait_for) => {
                cx.open_overlay_after(view, Payload::none(), wait_for);
            },
            Script::CloseOverlay(view) => cx.close_overlay(view),
            Script::CloseSelf => cx.close_self(),
        }
    }
}
