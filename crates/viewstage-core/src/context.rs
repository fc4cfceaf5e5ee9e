//! Hook context and the actions it records.
//!
//! Hooks run while the controller holds the instance mutably, so they cannot
//! call back into it. Instead each hook gets a [`ViewContext`] and records
//! what it wants: completing a transition or navigating somewhere. The
//! controller applies the recorded [`ViewAction`]s in order once the hook
//! returns.

use crate::{
    event::ControllerId,
    instance::{InstanceId, Transition, ViewState},
    payload::Payload,
    view::{DisplayMode, ViewId},
};

/// What an overlay request waits for before the overlay is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaitFor {
    /// Create immediately.
    #[default]
    Nothing,
    /// Close this overlay instance and create once it has finished hiding.
    Instance(InstanceId),
    /// Close every overlay and create once the first one has finished
    /// hiding.
    All,
}

/// Navigation a view asks the controller to perform.
#[derive(Debug)]
pub enum NavRequest {
    /// Change the location, waiting for the current one to hide.
    ChangeLocation {
        /// Target view.
        view: ViewId,
        /// Data for the target's show hook.
        payload: Payload,
    },
    /// Open an overlay.
    OpenOverlay {
        /// Overlay view.
        view: ViewId,
        /// Data for the overlay's show hook.
        payload: Payload,
        /// What to close first.
        wait_for: WaitFor,
    },
    /// Close every open overlay of a view.
    CloseOverlay {
        /// Overlay view.
        view: ViewId,
    },
    /// Close one overlay instance.
    CloseInstance {
        /// Instance to close.
        instance: InstanceId,
    },
}

/// Something a hook asked for.
#[derive(Debug)]
pub enum ViewAction {
    /// Redeem a transition token.
    Complete(Transition),
    /// Perform navigation.
    Navigate(NavRequest),
}

/// Handle given to every [`View`](crate::View) hook.
///
/// Navigation is only recorded while the calling view is `Active`. Requests
/// from a view that is still creating, showing, or hiding are dropped.
#[derive(Debug)]
pub struct ViewContext {
    controller: ControllerId,
    instance: InstanceId,
    view: ViewId,
    mode: DisplayMode,
    state: ViewState,
    actions: Vec<ViewAction>,
}

impl ViewContext {
    pub(crate) fn new(
        controller: ControllerId,
        instance: InstanceId,
        view: ViewId,
        mode: DisplayMode,
        state: ViewState,
    ) -> Self {
        Self { controller, instance, view, mode, state, actions: Vec::new() }
    }

    /// Controller running the hook.
    pub fn controller(&self) -> ControllerId {
        self.controller
    }

    /// Instance the hook runs for.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Registered view of the instance.
    pub fn view(&self) -> &ViewId {
        &self.view
    }

    /// Display mode of the instance.
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// State of the instance when the hook was called.
    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Complete an outstanding transition.
    pub fn complete(&mut self, done: Transition) {
        self.actions.push(ViewAction::Complete(done));
    }

    /// Change the location once the current one has hidden.
    pub fn change_location(&mut self, view: impl Into<ViewId>, payload: Payload) {
        self.navigate(NavRequest::ChangeLocation { view: view.into(), payload });
    }

    /// Open an overlay right away.
    pub fn open_overlay(&mut self, view: impl Into<ViewId>, payload: Payload) {
        self.open_overlay_after(view, payload, WaitFor::Nothing);
    }

    /// Open an overlay after closing what `wait_for` names.
    pub fn open_overlay_after(
        &mut self,
        view: impl Into<ViewId>,
        payload: Payload,
        wait_for: WaitFor,
    ) {
        self.navigate(NavRequest::OpenOverlay { view: view.into(), payload, wait_for });
    }

    /// Close every open overlay of `view`.
    pub fn close_overlay(&mut self, view: impl Into<ViewId>) {
        self.navigate(NavRequest::CloseOverlay { view: view.into() });
    }

    /// Close one overlay instance.
    pub fn close_instance(&mut self, instance: InstanceId) {
        self.navigate(NavRequest::CloseInstance { instance });
    }

    /// Close the calling overlay.
    pub fn close_self(&mut self) {
        self.close_instance(self.instance);
    }

    /// Record a navigation request.
    pub fn navigate(&mut self, request: NavRequest) {
        if self.state != ViewState::Active {
            tracing::trace!(
                instance = %self.instance,
                state = ?self.state,
                ?request,
                "ignoring navigation from inactive view"
            );
            return;
        }
        self.actions.push(ViewAction::Navigate(request));
    }

    /// Recorded actions, in order.
    pub fn actions(&self) -> &[ViewAction] {
        &self.actions
    }

    pub(crate) fn into_actions(self) -> Vec<ViewAction> {
        self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(state: ViewState) -> ViewContext {
        ViewContext::new(
            ControllerId::new(1),
            InstanceId::new(2),
            ViewId::new("Quit"),
            DisplayMode::Overlay,
            state,
        )
    }

    #[test]
    fn active_view_records_navigation() {
        let mut cx = context(ViewState::Active);
        cx.change_location("Title", Payload::none());
        cx.close_self();

        let actions = cx.into_actions();
        assert!(matches!(
            actions.as_slice(),
            [
                ViewAction::Navigate(NavRequest::ChangeLocation { .. }),
                ViewAction::Navigate(NavRequest::CloseInstance { instance }),
            ] if *instance == InstanceId::new(2)
        ));
    }

    #[test]
    fn inactive_view_navigation_is_dropped() {
        for state in [ViewState::Creating, ViewState::Showing, ViewState::Hiding] {
            let mut cx = context(state);
            cx.open_overlay("Quit", Payload::none());
            cx.close_overlay("Quit");
            assert!(cx.actions().is_empty(), "{state:?} recorded navigation");
        }
    }
}
