//! Per-view lifecycle state machine.
//!
//! A [`ViewInstance`] wraps one concrete [`View`] together with its visual
//! object and walks it through the lifecycle. The instance only changes its
//! own state and invokes hooks; everything that touches other views (queued
//! targets, the overlay list, resource counts) is done by the controller with
//! the actions the instance returns.
//!
//! # Transition tokens
//!
//! Each show or hide start bumps the instance epoch and hands the hook a
//! [`Transition`] stamped with it. A token is only accepted while the
//! instance is still in the matching state of the same epoch, so late
//! completions (an animation finishing after the view was re-shown or
//! destroyed) are ignored instead of corrupting the state.

use std::{fmt, time::Duration};

use crate::{
    context::{ViewAction, ViewContext},
    error::ViewError,
    event::{ControllerId, EventLog, ViewEventKind},
    payload::Payload,
    view::{DisplayMode, View, ViewId},
};

/// Identifies one instance of a view within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Wrap a raw instance number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw instance number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a view instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewState {
    /// Instantiated and being set up; not yet shown.
    Creating,
    /// Transitioning in.
    Showing,
    /// Fully shown.
    Active,
    /// Transitioning out.
    Hiding,
    /// Torn down; terminal.
    Destroyed,
}

impl ViewState {
    /// True while the view can be hidden (`Active` or `Showing`).
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Showing | Self::Active)
    }
}

/// Direction of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Transitioning in.
    Show,
    /// Transitioning out.
    Hide,
}

/// Continuation for an outstanding show or hide transition.
///
/// Handed to [`View::on_show_start`] and [`View::on_hide_start`]; redeeming
/// it completes the transition.
#[must_use = "a transition stays outstanding until its token is redeemed"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    instance: InstanceId,
    phase: Phase,
    epoch: u32,
}

impl Transition {
    /// Instance the transition belongs to.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Direction of the transition.
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Read-only snapshot of an instance, returned by controller queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Instance identifier.
    pub id: InstanceId,
    /// Registered view this instance was created from.
    pub view: ViewId,
    /// Location or overlay.
    pub mode: DisplayMode,
    /// Lifecycle state at the time of the query.
    pub state: ViewState,
}

/// One live view: behavior, visual object, and lifecycle bookkeeping.
pub(crate) struct ViewInstance<V> {
    id: InstanceId,
    view: ViewId,
    mode: DisplayMode,
    state: ViewState,
    epoch: u32,
    created: bool,
    behavior: Box<dyn View>,
    visual: V,
}

impl<V> ViewInstance<V> {
    pub(crate) fn new(
        id: InstanceId,
        view: ViewId,
        mode: DisplayMode,
        behavior: Box<dyn View>,
        visual: V,
    ) -> Self {
        Self {
            id,
            view,
            mode,
            state: ViewState::Creating,
            epoch: 0,
            created: false,
            behavior,
            visual,
        }
    }

    pub(crate) fn id(&self) -> InstanceId {
        self.id
    }

    pub(crate) fn view(&self) -> &ViewId {
        &self.view
    }

    pub(crate) fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub(crate) fn state(&self) -> ViewState {
        self.state
    }

    pub(crate) fn visual(&self) -> &V {
        &self.visual
    }

    pub(crate) fn info(&self) -> InstanceInfo {
        InstanceInfo { id: self.id, view: self.view.clone(), mode: self.mode, state: self.state }
    }

    pub(crate) fn sibling_index(&self, parent_children: Option<usize>) -> Option<usize> {
        self.behavior.sibling_index(self.mode, parent_children)
    }

    /// Run the creation hook.
    ///
    /// # Errors
    /// Returns `InvalidState` if the instance was already created.
    pub(crate) fn create(
        &mut self,
        controller: ControllerId,
    ) -> Result<Vec<ViewAction>, ViewError> {
        if self.created || self.state != ViewState::Creating {
            return Err(self.invalid("create"));
        }

        self.created = true;
        let mut cx = self.context(controller);
        self.behavior.on_create(&mut cx);
        Ok(cx.into_actions())
    }

    /// Start the show transition.
    ///
    /// Re-showing an `Active` or `Showing` view first cuts its outstanding
    /// transition short through the hide-complete hook; the old token goes
    /// stale.
    ///
    /// # Errors
    /// Returns `InvalidState` from `Hiding` or `Destroyed`, or before
    /// `create`.
    pub(crate) fn show(
        &mut self,
        payload: Payload,
        events: &mut EventLog,
    ) -> Result<Vec<ViewAction>, ViewError> {
        let mut actions = Vec::new();
        match self.state {
            ViewState::Creating if self.created => {},
            ViewState::Active | ViewState::Showing => {
                let mut cx = ViewContext::new(
                    events.controller(),
                    self.id,
                    self.view.clone(),
                    self.mode,
                    ViewState::Hiding,
                );
                self.behavior.on_hide_complete(&mut cx);
                actions.extend(cx.into_actions());
            },
            _ => return Err(self.invalid("show")),
        }

        self.state = ViewState::Showing;
        self.epoch = self.epoch.wrapping_add(1);
        events.emit(ViewEventKind::ShowStart, &self.view, self.mode, Some(self.id));

        let done = self.token(Phase::Show);
        let mut cx = self.context(events.controller());
        self.behavior.on_show_start(&mut cx, payload, done);
        actions.extend(cx.into_actions());
        Ok(actions)
    }

    /// Start the hide transition.
    ///
    /// # Errors
    /// Returns `InvalidState` unless the view is `Active` or `Showing`.
    pub(crate) fn hide(&mut self, events: &mut EventLog) -> Result<Vec<ViewAction>, ViewError> {
        if !self.state.is_visible() {
            return Err(self.invalid("hide"));
        }

        self.state = ViewState::Hiding;
        self.epoch = self.epoch.wrapping_add(1);
        events.emit(ViewEventKind::HideStart, &self.view, self.mode, Some(self.id));

        let done = self.token(Phase::Hide);
        let mut cx = self.context(events.controller());
        self.behavior.on_hide_start(&mut cx, done);
        Ok(cx.into_actions())
    }

    /// True if `transition` completes the instance's outstanding transition.
    pub(crate) fn accepts(&self, transition: Transition) -> bool {
        let expected = match transition.phase {
            Phase::Show => ViewState::Showing,
            Phase::Hide => ViewState::Hiding,
        };
        transition.instance == self.id && transition.epoch == self.epoch && self.state == expected
    }

    /// Finish the show transition. The caller checks [`Self::accepts`].
    pub(crate) fn finish_show(&mut self, events: &mut EventLog) -> Vec<ViewAction> {
        debug_assert_eq!(self.state, ViewState::Showing);

        self.state = ViewState::Active;
        events.emit(ViewEventKind::ShowComplete, &self.view, self.mode, Some(self.id));

        let mut cx = self.context(events.controller());
        self.behavior.on_show_complete(&mut cx);
        cx.into_actions()
    }

    /// Finish the hide transition and mark the instance destroyed. The caller
    /// checks [`Self::accepts`] and tears down the visual afterwards.
    pub(crate) fn finish_hide(&mut self, events: &mut EventLog) -> Vec<ViewAction> {
        debug_assert_eq!(self.state, ViewState::Hiding);

        let mut cx = self.context(events.controller());
        self.behavior.on_hide_complete(&mut cx);
        events.emit(ViewEventKind::HideComplete, &self.view, self.mode, Some(self.id));

        self.state = ViewState::Destroyed;
        cx.into_actions()
    }

    /// Per-frame hook.
    pub(crate) fn update(&mut self, controller: ControllerId, delta: Duration) -> Vec<ViewAction> {
        let mut cx = self.context(controller);
        self.behavior.on_update(&mut cx, delta);
        cx.into_actions()
    }

    /// Deliver a host message.
    pub(crate) fn message(
        &mut self,
        controller: ControllerId,
        message: &Payload,
    ) -> Vec<ViewAction> {
        let mut cx = self.context(controller);
        self.behavior.on_message(&mut cx, message);
        cx.into_actions()
    }

    pub(crate) fn into_visual(self) -> V {
        self.visual
    }

    fn token(&self, phase: Phase) -> Transition {
        Transition { instance: self.id, phase, epoch: self.epoch }
    }

    fn context(&self, controller: ControllerId) -> ViewContext {
        ViewContext::new(controller, self.id, self.view.clone(), self.mode, self.state)
    }

    fn invalid(&self, operation: &'static str) -> ViewError {
        ViewError::InvalidState { instance: self.id, state: self.state, operation }
    }
}

impl<V: fmt::Debug> fmt::Debug for ViewInstance<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewInstance")
            .field("id", &self.id)
            .field("view", &self.view)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("epoch", &self.epoch)
            .field("visual", &self.visual)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keeps its tokens instead of completing right away.
    #[derive(Debug, Default)]
    struct Held {
        pending: Option<Transition>,
    }

    impl View for Held {
        fn on_show_start(&mut self, _cx: &mut ViewContext, _payload: Payload, done: Transition) {
            self.pending = Some(done);
        }

        fn on_hide_start(&mut self, _cx: &mut ViewContext, done: Transition) {
            self.pending = Some(done);
        }

        fn on_update(&mut self, cx: &mut ViewContext, _delta: Duration) {
            if let Some(done) = self.pending.take() {
                cx.complete(done);
            }
        }
    }

    fn instance(view: impl View + 'static) -> ViewInstance<()> {
        ViewInstance::new(
            InstanceId::new(1),
            ViewId::new("Title"),
            DisplayMode::Location,
            Box::new(view),
            (),
        )
    }

    fn completion(actions: &[ViewAction]) -> Transition {
        match actions {
            [ViewAction::Complete(done)] => *done,
            other => unreachable!("expected a single completion, got {other:?}"),
        }
    }

    #[test]
    fn immediate_lifecycle() {
        let mut events = EventLog::new(ControllerId::new(7), None);
        let mut view = instance(Plain);

        assert!(view.create(events.controller()).unwrap().is_empty());
        assert_eq!(view.state(), ViewState::Creating);

        let actions = view.show(Payload::none(), &mut events).unwrap();
        assert_eq!(view.state(), ViewState::Showing);
        let done = completion(&actions);
        assert_eq!(done.phase(), Phase::Show);
        assert!(view.accepts(done));

        view.finish_show(&mut events);
        assert_eq!(view.state(), ViewState::Active);
        assert!(!view.accepts(done));

        let actions = view.hide(&mut events).unwrap();
        assert_eq!(view.state(), ViewState::Hiding);
        let done = completion(&actions);
        assert!(view.accepts(done));

        view.finish_hide(&mut events);
        assert_eq!(view.state(), ViewState::Destroyed);

        let kinds: Vec<_> = events.drain().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViewEventKind::ShowStart,
                ViewEventKind::ShowComplete,
                ViewEventKind::HideStart,
                ViewEventKind::HideComplete,
            ]
        );
    }

    #[derive(Debug)]
    struct Plain;

    impl View for Plain {}

    #[test]
    fn create_only_once() {
        let mut view = instance(Plain);
        view.create(ControllerId::new(1)).unwrap();
        let result = view.create(ControllerId::new(1));
        assert!(matches!(result, Err(ViewError::InvalidState { operation: "create", .. })));
    }

    #[test]
    fn show_requires_create() {
        let mut events = EventLog::new(ControllerId::new(1), None);
        let mut view = instance(Plain);
        let result = view.show(Payload::none(), &mut events);
        assert!(matches!(result, Err(ViewError::InvalidState { state: ViewState::Creating, .. })));
    }

    #[test]
    fn hide_only_when_visible() {
        let mut events = EventLog::new(ControllerId::new(1), None);
        let mut view = instance(Held::default());
        view.create(events.controller()).unwrap();

        assert!(matches!(view.hide(&mut events), Err(ViewError::InvalidState { .. })));

        view.show(Payload::none(), &mut events).unwrap();
        assert!(view.hide(&mut events).unwrap().is_empty());
        assert!(matches!(view.hide(&mut events), Err(ViewError::InvalidState { .. })));
        assert!(matches!(
            view.show(Payload::none(), &mut events),
            Err(ViewError::InvalidState { state: ViewState::Hiding, .. })
        ));
    }

    #[test]
    fn deferred_completion_through_update() {
        let mut events = EventLog::new(ControllerId::new(1), None);
        let mut view = instance(Held::default());
        view.create(events.controller()).unwrap();

        assert!(view.show(Payload::none(), &mut events).unwrap().is_empty());
        let done = completion(&view.update(events.controller(), Duration::from_millis(16)));
        assert!(view.accepts(done));
        assert!(view.update(events.controller(), Duration::from_millis(16)).is_empty());
    }

    #[test]
    fn reshow_makes_old_token_stale() {
        let mut events = EventLog::new(ControllerId::new(1), None);
        let mut view = instance(Held::default());
        view.create(events.controller()).unwrap();

        view.show(Payload::none(), &mut events).unwrap();
        let first = completion(&view.update(events.controller(), Duration::ZERO));

        view.show(Payload::none(), &mut events).unwrap();
        assert_eq!(view.state(), ViewState::Showing);
        assert!(!view.accepts(first));

        let second = completion(&view.update(events.controller(), Duration::ZERO));
        assert!(view.accepts(second));
    }

    #[test]
    fn token_for_other_phase_is_rejected() {
        let mut events = EventLog::new(ControllerId::new(1), None);
        let mut view = instance(Held::default());
        view.create(events.controller()).unwrap();

        view.show(Payload::none(), &mut events).unwrap();
        let show = completion(&view.update(events.controller(), Duration::ZERO));
        view.hide(&mut events).unwrap();

        assert!(!view.accepts(show));
    }
}
