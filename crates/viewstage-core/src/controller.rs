//! View controller: the location slot, the overlay set, and queued targets.
//!
//! The controller is the only mutator of shared state. Public operations and
//! the actions recorded by view hooks all funnel into the same private
//! methods, and every hide completion goes through
//! [`ViewController::complete`], which is the single place queued targets
//! are resolved and finished instances are torn down.
//!
//! # Queued targets
//!
//! A non-immediate location change hides the current location and parks the
//! requested view in `target_location`. Further changes issued before the
//! hide finishes replace the parked target, so only the newest request is
//! ever instantiated. Overlays that wait on other overlays use
//! `target_overlay` the same way.

use std::{collections::BTreeMap, time::Duration};

use crate::{
    config::ControllerConfig,
    context::{NavRequest, ViewAction, WaitFor},
    descriptor::{ViewDescriptor, ViewRegistry},
    error::ViewError,
    event::{ControllerId, EventLog, ViewEvent, ViewEventKind},
    host::{Instantiated, ResourceLoader, SceneHost},
    instance::{InstanceId, InstanceInfo, Phase, Transition, ViewInstance, ViewState},
    payload::Payload,
    view::{DisplayMode, ViewId},
};

/// Lifecycle logging: `info` when the controller runs in debug mode,
/// `debug` otherwise.
macro_rules! lifecycle {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Orchestrates view instances for one application surface.
///
/// `L` loads view resources and `H` turns them into visual objects with
/// attached [`View`](crate::View) behavior.
pub struct ViewController<L, H>
where
    L: ResourceLoader,
    H: SceneHost<L::Handle>,
{
    config: ControllerConfig,
    registry: ViewRegistry<L::Handle>,
    loader: L,
    host: H,
    view_parent: Option<H::Parent>,
    instances: BTreeMap<InstanceId, ViewInstance<H::Visual>>,
    next_instance: u64,
    is_setup: bool,
    current_location: Option<InstanceId>,
    last_location: Option<ViewId>,
    target_location: Option<(ViewId, Payload)>,
    overlays: Vec<InstanceId>,
    target_overlay: Option<(ViewId, Payload)>,
    events: EventLog,
}

impl<L, H> ViewController<L, H>
where
    L: ResourceLoader,
    H: SceneHost<L::Handle>,
{
    /// Create a controller over the views registered in `config`.
    pub fn new(config: ControllerConfig, loader: L, host: H) -> Self {
        let registry = ViewRegistry::new(&config.views);
        let id = ControllerId::next();
        let events = EventLog::new(id, config.event_capacity);
        lifecycle!(
            config.debug,
            controller = id.get(),
            views = registry.len(),
            "view controller created"
        );

        Self {
            config,
            registry,
            loader,
            host,
            view_parent: None,
            instances: BTreeMap::new(),
            next_instance: 1,
            is_setup: false,
            current_location: None,
            last_location: None,
            target_location: None,
            overlays: Vec::new(),
            target_overlay: None,
            events,
        }
    }

    /// Parent views under `parent` from now on.
    #[must_use]
    pub fn with_view_parent(mut self, parent: H::Parent) -> Self {
        self.view_parent = Some(parent);
        self
    }

    /// Replace the visual parent for views created from now on.
    pub fn set_view_parent(&mut self, parent: Option<H::Parent>) {
        self.view_parent = parent;
    }

    /// Identifier stamped on emitted events.
    pub fn id(&self) -> ControllerId {
        self.events.controller()
    }

    /// Configuration the controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// True once [`Self::setup`] has run.
    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    /// Show the starting location. Runs once; later calls do nothing.
    ///
    /// `start` overrides the configured starting location.
    ///
    /// # Errors
    /// Propagates errors from the initial location change. The controller
    /// stays un-set-up if the starting view is not registered.
    pub fn setup(&mut self, start: Option<ViewId>) -> Result<(), ViewError> {
        if self.is_setup {
            return Ok(());
        }

        let start = start.or_else(|| self.config.starting_location.clone());
        let start = start.map(|id| self.validate(id)).transpose()?;
        self.is_setup = true;

        match start {
            Some(id) => self.change_location(id, Payload::none(), false),
            None => Ok(()),
        }
    }

    /// Change the location to `view`.
    ///
    /// Without a current location the view is created right away. With
    /// `immediate`, the current location is hidden and the new one created
    /// without waiting; both transitions run concurrently. Otherwise the
    /// request is queued until the current location has finished hiding,
    /// replacing any request queued before it.
    ///
    /// # Errors
    /// `InvalidView` for unregistered views, or any creation error.
    pub fn change_location(
        &mut self,
        view: impl Into<ViewId>,
        payload: Payload,
        immediate: bool,
    ) -> Result<(), ViewError> {
        let id = self.validate(view.into())?;
        if self.current_location_view() == Some(&id) {
            tracing::trace!(view = %id, "already the current location");
            return Ok(());
        }

        self.events.emit(ViewEventKind::ViewRequested, &id, DisplayMode::Location, None);
        lifecycle!(self.config.debug, view = %id, immediate, "location requested");

        let Some(current) = self.current_location else {
            return self.create_location(id, payload).map(|_| ());
        };

        if immediate {
            if let Some((dropped, _)) = self.target_location.take() {
                tracing::debug!(view = %dropped, "queued location discarded by immediate change");
            }
            self.hide_instance(current)?;
            return self.create_location(id, payload).map(|_| ());
        }

        if let Some((dropped, _)) = self.target_location.replace((id, payload)) {
            tracing::debug!(view = %dropped, "queued location superseded");
        }
        self.hide_instance(current)
    }

    /// Open an overlay of `view`.
    ///
    /// With `WaitFor::Instance` naming an open overlay, or `WaitFor::All`
    /// while any overlay is open, the request is queued and those overlays
    /// are closed; the new overlay is created when the first of them has
    /// finished hiding. Otherwise the overlay is created right away.
    ///
    /// Returns the new instance when it was created without waiting.
    ///
    /// # Errors
    /// `InvalidView` for unregistered views, or any creation error.
    pub fn open_overlay(
        &mut self,
        view: impl Into<ViewId>,
        payload: Payload,
        wait_for: WaitFor,
    ) -> Result<Option<InstanceId>, ViewError> {
        let id = self.validate(view.into())?;
        self.events.emit(ViewEventKind::ViewRequested, &id, DisplayMode::Overlay, None);
        lifecycle!(self.config.debug, view = %id, ?wait_for, "overlay requested");

        match wait_for {
            WaitFor::Instance(instance) if self.overlays.contains(&instance) => {
                self.queue_overlay(id, payload);
                self.hide_instance(instance)?;
                Ok(None)
            },
            WaitFor::All if !self.overlays.is_empty() => {
                self.queue_overlay(id, payload);
                self.close_all_overlays()?;
                Ok(None)
            },
            _ => self.create_overlay(id, payload).map(Some),
        }
    }

    /// Hide every open overlay of `view`.
    ///
    /// # Errors
    /// `InvalidView` for unregistered views, or the first error raised while
    /// hiding. Every matching overlay is hidden either way.
    pub fn close_overlay(&mut self, view: impl Into<ViewId>) -> Result<(), ViewError> {
        let id = self.validate(view.into())?;
        let matching: Vec<InstanceId> = self
            .overlays
            .iter()
            .rev()
            .copied()
            .filter(|instance| self.instances.get(instance).is_some_and(|open| *open.view() == id))
            .collect();

        self.hide_each(matching)
    }

    /// Hide one overlay instance. Does nothing if it is not open.
    ///
    /// # Errors
    /// Propagates errors from actions recorded by the hide hooks.
    pub fn close_overlay_instance(&mut self, instance: InstanceId) -> Result<(), ViewError> {
        if !self.overlays.contains(&instance) {
            tracing::trace!(%instance, "close of an overlay that is not open");
            return Ok(());
        }
        self.hide_instance(instance)
    }

    /// Hide every overlay open at the time of the call.
    ///
    /// # Errors
    /// The first error raised while hiding, for example a queued overlay
    /// that fails to create. The remaining overlays are still hidden.
    pub fn close_all_overlays(&mut self) -> Result<(), ViewError> {
        let snapshot = self.overlays.clone();
        self.hide_each(snapshot)
    }

    /// Load the resource of `view` without instantiating it.
    ///
    /// Balanced by one [`Self::unload`].
    ///
    /// # Errors
    /// `InvalidView` or `MissingResource`.
    pub fn preload(&mut self, view: impl Into<ViewId>) -> Result<(), ViewError> {
        let id = view.into();
        let descriptor = Self::descriptor_mut(&mut self.registry, &id)?;
        descriptor.load(&mut self.loader)?;
        Ok(())
    }

    /// Drop one reference to the resource of `view`.
    ///
    /// Returns true if the resource was released.
    ///
    /// # Errors
    /// `InvalidView` for unregistered views.
    pub fn unload(&mut self, view: impl Into<ViewId>) -> Result<bool, ViewError> {
        let id = view.into();
        let descriptor = Self::descriptor_mut(&mut self.registry, &id)?;
        Ok(descriptor.unload(&mut self.loader, false))
    }

    /// Release every held resource regardless of reference counts.
    pub fn unload_all(&mut self) {
        self.registry.unload_all(&mut self.loader);
    }

    /// Redeem a transition token on behalf of the host.
    ///
    /// Returns false without doing anything when the token is stale: its
    /// instance is gone, was re-shown since, or is in the other phase.
    ///
    /// # Errors
    /// Propagates errors from resolving queued targets or from actions
    /// recorded by the completion hooks.
    pub fn complete(&mut self, transition: Transition) -> Result<bool, ViewError> {
        let id = transition.instance();
        let Some(instance) = self.instances.get_mut(&id) else {
            tracing::trace!(instance = %id, "stale transition for destroyed instance");
            return Ok(false);
        };
        if !instance.accepts(transition) {
            tracing::trace!(instance = %id, phase = ?transition.phase(), "stale transition");
            return Ok(false);
        }

        match transition.phase() {
            Phase::Show => {
                let actions = instance.finish_show(&mut self.events);
                tracing::debug!(instance = %id, "show complete");
                self.apply(actions)?;
            },
            Phase::Hide => self.on_hide_complete(id)?,
        }
        Ok(true)
    }

    /// Run every live view's update hook.
    ///
    /// # Errors
    /// Propagates errors from actions recorded by the hooks.
    pub fn tick(&mut self, delta: Duration) -> Result<(), ViewError> {
        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        for id in ids {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            let actions = instance.update(self.events.controller(), delta);
            self.apply(actions)?;
        }
        Ok(())
    }

    /// Deliver a host message to one view.
    ///
    /// # Errors
    /// `UnknownInstance` if no such instance is alive, or errors from the
    /// actions the view records in response.
    pub fn send(&mut self, instance: InstanceId, message: &Payload) -> Result<(), ViewError> {
        let view = self.instances.get_mut(&instance).ok_or(ViewError::UnknownInstance(instance))?;
        let actions = view.message(self.events.controller(), message);
        self.apply(actions)
    }

    /// Perform navigation on behalf of `instance`.
    ///
    /// Returns false and does nothing unless the instance is alive and
    /// `Active`.
    ///
    /// # Errors
    /// Propagates errors from the navigation itself.
    pub fn request(
        &mut self,
        instance: InstanceId,
        request: NavRequest,
    ) -> Result<bool, ViewError> {
        let active = self
            .instances
            .get(&instance)
            .is_some_and(|view| view.state() == ViewState::Active);
        if !active {
            tracing::trace!(%instance, ?request, "ignoring navigation from inactive view");
            return Ok(false);
        }

        self.navigate(request)?;
        Ok(true)
    }

    /// Show a live view again, cutting any outstanding show short.
    ///
    /// # Errors
    /// `UnknownInstance`, or `InvalidState` if the view is hiding.
    pub fn reshow(&mut self, instance: InstanceId, payload: Payload) -> Result<(), ViewError> {
        self.show_instance(instance, payload)
    }

    /// Current location, if any.
    pub fn current_location(&self) -> Option<InstanceInfo> {
        self.current_location.and_then(|id| self.instance(id))
    }

    /// View of the location shown before the current one.
    pub fn last_location(&self) -> Option<&ViewId> {
        self.last_location.as_ref()
    }

    /// Location waiting for the current one to finish hiding.
    pub fn target_location(&self) -> Option<&ViewId> {
        self.target_location.as_ref().map(|(id, _)| id)
    }

    /// Overlay waiting for another overlay to finish hiding.
    pub fn target_overlay(&self) -> Option<&ViewId> {
        self.target_overlay.as_ref().map(|(id, _)| id)
    }

    /// Snapshot of the open overlays, oldest first.
    pub fn showing_overlays(&self) -> Vec<InstanceInfo> {
        self.overlays.iter().filter_map(|id| self.instance(*id)).collect()
    }

    /// Number of views whose resource is held.
    pub fn loaded_resource_count(&self) -> usize {
        self.registry.loaded_count()
    }

    /// True if `view` is registered.
    pub fn has_view(&self, view: &str) -> bool {
        self.registry.contains(view)
    }

    /// True if the resource of `view` is held.
    pub fn is_view_loaded(&self, view: &str) -> bool {
        self.registry.get(view).is_some_and(|descriptor| descriptor.is_loaded())
    }

    /// Reference count of `view`'s resource; zero for unknown views.
    pub fn ref_count(&self, view: &str) -> u32 {
        self.registry.get(view).map_or(0, |descriptor| descriptor.ref_count())
    }

    /// True if any overlay of `view` is open.
    pub fn is_overlay_open(&self, view: &str) -> bool {
        self.overlays
            .iter()
            .filter_map(|id| self.instances.get(id))
            .any(|instance| instance.view().as_str() == view)
    }

    /// True if `instance` has not been destroyed yet.
    pub fn is_instance_open(&self, instance: InstanceId) -> bool {
        self.instances.contains_key(&instance)
    }

    /// Snapshot of a live instance.
    pub fn instance(&self, instance: InstanceId) -> Option<InstanceInfo> {
        self.instances.get(&instance).map(ViewInstance::info)
    }

    /// Number of instances not yet destroyed.
    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    /// Remove and yield buffered lifecycle events in emission order.
    ///
    /// Events accumulate until drained; see
    /// [`ControllerConfig::event_capacity`] for a bound.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ViewEvent> + '_ {
        self.events.drain()
    }

    /// Number of lifecycle events waiting to be drained.
    pub fn buffered_events(&self) -> usize {
        self.events.len()
    }

    /// Lifecycle events discarded because the buffer was full.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Scene host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Resource loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    fn validate(&self, id: ViewId) -> Result<ViewId, ViewError> {
        if self.registry.contains(id.as_str()) { Ok(id) } else { Err(ViewError::InvalidView(id)) }
    }

    fn descriptor_mut<'a>(
        registry: &'a mut ViewRegistry<L::Handle>,
        id: &ViewId,
    ) -> Result<&'a mut ViewDescriptor<L::Handle>, ViewError> {
        registry.get_mut(id.as_str()).ok_or_else(|| ViewError::InvalidView(id.clone()))
    }

    fn current_location_view(&self) -> Option<&ViewId> {
        self.current_location.and_then(|id| self.instances.get(&id)).map(ViewInstance::view)
    }

    fn queue_overlay(&mut self, id: ViewId, payload: Payload) {
        if let Some((dropped, _)) = self.target_overlay.replace((id, payload)) {
            tracing::debug!(view = %dropped, "queued overlay superseded");
        }
    }

    fn create_location(&mut self, id: ViewId, payload: Payload) -> Result<InstanceId, ViewError> {
        let instance = self.create_view(id, DisplayMode::Location)?;
        if let Some(previous) = self.current_location.replace(instance) {
            if let Some(view) = self.instances.get(&previous) {
                self.last_location = Some(view.view().clone());
            }
        }
        self.show_instance(instance, payload)?;
        Ok(instance)
    }

    fn create_overlay(&mut self, id: ViewId, payload: Payload) -> Result<InstanceId, ViewError> {
        let instance = self.create_view(id, DisplayMode::Overlay)?;
        self.overlays.push(instance);
        self.show_instance(instance, payload)?;
        Ok(instance)
    }

    /// Load, instantiate, parent, order, and create a new instance.
    fn create_view(&mut self, id: ViewId, mode: DisplayMode) -> Result<InstanceId, ViewError> {
        let descriptor = Self::descriptor_mut(&mut self.registry, &id)?;
        let resource = descriptor.load(&mut self.loader)?;
        let Instantiated { visual, view } =
            self.host.instantiate(resource, self.view_parent.as_ref());

        let Some(behavior) = view else {
            tracing::warn!(view = %id, "instantiated resource has no view component");
            self.host.destroy(visual);
            if let Some(descriptor) = self.registry.get_mut(id.as_str()) {
                descriptor.unload(&mut self.loader, false);
            }
            return Err(ViewError::MissingViewComponent(id));
        };

        let instance_id = InstanceId::new(self.next_instance);
        self.next_instance += 1;

        let mut instance = ViewInstance::new(instance_id, id.clone(), mode, behavior, visual);
        let children = self.view_parent.as_ref().map(|parent| self.host.child_count(parent));
        if let Some(index) = instance.sibling_index(children) {
            self.host.set_order(instance.visual(), index);
        }

        let actions = instance.create(self.events.controller())?;
        self.instances.insert(instance_id, instance);
        self.events.emit(ViewEventKind::ViewCreated, &id, mode, Some(instance_id));
        lifecycle!(self.config.debug, view = %id, instance = %instance_id, %mode, "view created");

        self.apply(actions)?;
        Ok(instance_id)
    }

    fn show_instance(&mut self, id: InstanceId, payload: Payload) -> Result<(), ViewError> {
        let instance = self.instances.get_mut(&id).ok_or(ViewError::UnknownInstance(id))?;
        self.host.set_enabled(instance.visual(), true);
        let actions = instance.show(payload, &mut self.events)?;
        tracing::debug!(instance = %id, "show started");
        self.apply(actions)
    }

    /// Hide each instance in order, keeping the first error.
    fn hide_each(&mut self, instances: Vec<InstanceId>) -> Result<(), ViewError> {
        let mut first_error = None;
        for instance in instances {
            if let Err(err) = self.hide_instance(instance) {
                tracing::warn!(%instance, %err, "error while hiding overlay");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Start hiding `id` if it is visible. No-op otherwise.
    fn hide_instance(&mut self, id: InstanceId) -> Result<(), ViewError> {
        let Some(instance) = self.instances.get_mut(&id) else {
            return Ok(());
        };
        if !instance.state().is_visible() {
            return Ok(());
        }

        let actions = instance.hide(&mut self.events)?;
        tracing::debug!(instance = %id, "hide started");
        self.apply(actions)
    }

    /// Tear down a finished instance and resolve whatever was waiting on it.
    fn on_hide_complete(&mut self, id: InstanceId) -> Result<(), ViewError> {
        let Some(mut instance) = self.instances.remove(&id) else {
            return Ok(());
        };

        let actions = instance.finish_hide(&mut self.events);
        let view = instance.view().clone();
        let mode = instance.mode();
        self.host.destroy(instance.into_visual());
        if let Some(descriptor) = self.registry.get_mut(view.as_str()) {
            descriptor.unload(&mut self.loader, false);
        }
        lifecycle!(self.config.debug, view = %view, instance = %id, %mode, "view destroyed");

        let created = match mode {
            DisplayMode::Overlay => {
                self.overlays.retain(|open| *open != id);
                match self.target_overlay.take() {
                    Some((target, payload)) => self.create_overlay(target, payload).map(|_| ()),
                    None => Ok(()),
                }
            },
            DisplayMode::Location if self.current_location == Some(id) => {
                self.current_location = None;
                self.last_location = Some(view);
                match self.target_location.take() {
                    Some((target, payload)) => self.create_location(target, payload).map(|_| ()),
                    None => Ok(()),
                }
            },
            DisplayMode::Location => Ok(()),
        };

        // The finished view's own actions still run when the target failed.
        let applied = self.apply(actions);
        created.and(applied)
    }

    fn apply(&mut self, actions: Vec<ViewAction>) -> Result<(), ViewError> {
        for action in actions {
            match action {
                ViewAction::Complete(transition) => {
                    self.complete(transition)?;
                },
                ViewAction::Navigate(request) => self.navigate(request)?,
            }
        }
        Ok(())
    }

    fn navigate(&mut self, request: NavRequest) -> Result<(), ViewError> {
        match request {
            NavRequest::ChangeLocation { view, payload } => {
                self.change_location(view, payload, false)
            },
            NavRequest::OpenOverlay { view, payload, wait_for } => {
                self.open_overlay(view, payload, wait_for).map(|_| ())
            },
            NavRequest::CloseOverlay { view } => self.close_overlay(view),
            NavRequest::CloseInstance { instance } => self.close_overlay_instance(instance),
        }
    }
}

impl<L, H> std::fmt::Debug for ViewController<L, H>
where
    L: ResourceLoader,
    H: SceneHost<L::Handle>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewController")
            .field("id", &self.events.controller())
            .field("current_location", &self.current_location)
            .field("last_location", &self.last_location)
            .field("target_location", &self.target_location())
            .field("overlays", &self.overlays)
            .field("target_overlay", &self.target_overlay())
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{View, ViewContext, ViewState};

    /// Tokens parked by [`Parked`] views, shared with the test.
    type Parking = Rc<RefCell<Vec<Transition>>>;

    #[derive(Debug)]
    struct Instant;

    impl View for Instant {}

    #[derive(Debug)]
    struct Parked(Parking);

    impl View for Parked {
        fn on_show_start(&mut self, _cx: &mut ViewContext, _payload: Payload, done: Transition) {
            self.0.borrow_mut().push(done);
        }

        fn on_hide_start(&mut self, _cx: &mut ViewContext, done: Transition) {
            self.0.borrow_mut().push(done);
        }
    }

    #[derive(Debug, Default)]
    struct Loader {
        released: Vec<String>,
    }

    impl ResourceLoader for Loader {
        type Handle = String;

        fn load(&mut self, path: &str) -> Option<String> {
            (path != "missing").then(|| path.to_string())
        }

        fn release(&mut self, handle: String) {
            self.released.push(handle);
        }
    }

    #[derive(Debug, Default)]
    struct Host {
        parking: Parking,
        next: u32,
        destroyed: Vec<u32>,
        orders: Vec<(u32, usize)>,
        children: usize,
    }

    impl SceneHost<String> for Host {
        type Visual = u32;
        type Parent = ();

        fn instantiate(&mut self, resource: &String, parent: Option<&()>) -> Instantiated<u32> {
            self.next += 1;
            if parent.is_some() {
                self.children += 1;
            }
            let view: Option<Box<dyn View>> = match resource.as_str() {
                "instant" => Some(Box::new(Instant)),
                "parked" => Some(Box::new(Parked(Rc::clone(&self.parking)))),
                _ => None,
            };
            Instantiated { visual: self.next, view }
        }

        fn child_count(&self, _parent: &()) -> usize {
            self.children
        }

        fn set_order(&mut self, visual: &u32, index: usize) {
            self.orders.push((*visual, index));
        }

        fn set_enabled(&mut self, _visual: &u32, _enabled: bool) {}

        fn destroy(&mut self, visual: u32) {
            self.destroyed.push(visual);
        }
    }

    type Controller = ViewController<Loader, Host>;

    fn controller() -> Controller {
        let config = ControllerConfig::new()
            .with_view("Title", "instant")
            .with_view("LevelSelect", "instant")
            .with_view("Slow", "parked")
            .with_view("SlowToo", "parked")
            .with_view("Quit", "instant")
            .with_view("Broken", "bare")
            .with_view("Gone", "missing");
        ViewController::new(config, Loader::default(), Host::default())
    }

    fn parked(controller: &Controller) -> Vec<Transition> {
        controller.host().parking.borrow_mut().drain(..).collect()
    }

    #[test]
    fn setup_shows_starting_location() {
        let mut controller = controller();
        controller.setup(Some(ViewId::new("Title"))).unwrap();

        let current = controller.current_location().unwrap();
        assert_eq!(current.view, "Title");
        assert_eq!(current.state, ViewState::Active);
        assert!(controller.is_setup());

        controller.setup(Some(ViewId::new("LevelSelect"))).unwrap();
        assert_eq!(controller.current_location().unwrap().view, "Title");
    }

    #[test]
    fn setup_with_unknown_start_changes_nothing() {
        let mut controller = controller();
        let err = controller.setup(Some(ViewId::new("Nope"))).unwrap_err();
        assert_eq!(err, ViewError::InvalidView(ViewId::new("Nope")));
        assert!(!controller.is_setup());
        assert_eq!(controller.drain_events().count(), 0);
    }

    #[test]
    fn unknown_views_are_rejected() {
        let mut controller = controller();
        controller.change_location("Title", Payload::none(), false).unwrap();
        controller.drain_events().for_each(drop);

        assert!(matches!(
            controller.change_location("Nope", Payload::none(), false),
            Err(ViewError::InvalidView(_))
        ));
        assert!(matches!(
            controller.open_overlay("Nope", Payload::none(), WaitFor::Nothing),
            Err(ViewError::InvalidView(_))
        ));
        assert!(matches!(controller.close_overlay("Nope"), Err(ViewError::InvalidView(_))));
        assert!(matches!(controller.unload("Nope"), Err(ViewError::InvalidView(_))));

        assert_eq!(controller.drain_events().count(), 0);
        assert_eq!(controller.current_location().unwrap().view, "Title");
    }

    #[test]
    fn requesting_current_location_is_silent() {
        let mut controller = controller();
        controller.change_location("Title", Payload::none(), false).unwrap();
        controller.drain_events().for_each(drop);

        controller.change_location("Title", Payload::none(), false).unwrap();
        assert_eq!(controller.drain_events().count(), 0);
        assert_eq!(controller.ref_count("Title"), 1);
    }

    #[test]
    fn deferred_changes_coalesce() {
        let mut controller = controller();
        controller.change_location("Slow", Payload::none(), false).unwrap();
        let show = parked(&controller);
        assert!(controller.complete(show[0]).unwrap());

        controller.change_location("Title", Payload::none(), false).unwrap();
        controller.change_location("LevelSelect", Payload::none(), false).unwrap();
        assert_eq!(controller.target_location().map(ViewId::as_str), Some("LevelSelect"));
        assert_eq!(controller.ref_count("Title"), 0);

        let hide = parked(&controller);
        assert_eq!(hide.len(), 1);
        assert!(controller.complete(hide[0]).unwrap());

        let current = controller.current_location().unwrap();
        assert_eq!(current.view, "LevelSelect");
        assert_eq!(controller.last_location().map(ViewId::as_str), Some("Slow"));
        assert_eq!(controller.target_location(), None);
        assert_eq!(controller.ref_count("Title"), 0);
        assert_eq!(controller.ref_count("Slow"), 0);
        assert_eq!(controller.live_instances(), 1);
    }

    #[test]
    fn immediate_change_runs_both_transitions() {
        let mut controller = controller();
        controller.change_location("Slow", Payload::none(), false).unwrap();
        let show = parked(&controller);
        controller.complete(show[0]).unwrap();

        controller.change_location("SlowToo", Payload::none(), true).unwrap();
        let tokens = parked(&controller);
        assert_eq!(tokens.len(), 2);
        assert_eq!(controller.live_instances(), 2);
        assert_eq!(controller.current_location().unwrap().view, "SlowToo");
        assert_eq!(controller.last_location().map(ViewId::as_str), Some("Slow"));

        for token in tokens {
            assert!(controller.complete(token).unwrap());
        }
        assert_eq!(controller.live_instances(), 1);
        assert_eq!(controller.current_location().unwrap().state, ViewState::Active);
        assert_eq!(controller.ref_count("Slow"), 0);
    }

    #[test]
    fn immediate_change_drops_queued_target() {
        let mut controller = controller();
        controller.change_location("Slow", Payload::none(), false).unwrap();
        let show = parked(&controller);
        controller.complete(show[0]).unwrap();

        controller.change_location("Title", Payload::none(), false).unwrap();
        controller.change_location("LevelSelect", Payload::none(), true).unwrap();
        assert_eq!(controller.target_location(), None);

        let hide = parked(&controller);
        controller.complete(hide[0]).unwrap();
        assert_eq!(controller.current_location().unwrap().view, "LevelSelect");
        assert_eq!(controller.ref_count("Title"), 0);
    }

    #[test]
    fn duplicate_overlays_close_independently() {
        let mut controller = controller();
        let first =
            controller.open_overlay("Quit", Payload::none(), WaitFor::Nothing).unwrap().unwrap();
        let second =
            controller.open_overlay("Quit", Payload::none(), WaitFor::Nothing).unwrap().unwrap();
        assert_ne!(first, second);
        assert_eq!(controller.ref_count("Quit"), 2);

        controller.close_overlay_instance(first).unwrap();
        let open: Vec<InstanceId> =
            controller.showing_overlays().into_iter().map(|info| info.id).collect();
        assert_eq!(open, vec![second]);

        controller.close_overlay_instance(first).unwrap();
        controller.close_overlay("Quit").unwrap();
        assert!(controller.showing_overlays().is_empty());
        assert!(!controller.is_view_loaded("Quit"));
    }

    #[test]
    fn overlay_waits_for_instance() {
        let mut controller = controller();
        let slow =
            controller.open_overlay("Slow", Payload::none(), WaitFor::Nothing).unwrap().unwrap();
        let show = parked(&controller);
        controller.complete(show[0]).unwrap();

        let created =
            controller.open_overlay("Quit", Payload::none(), WaitFor::Instance(slow)).unwrap();
        assert_eq!(created, None);
        assert_eq!(controller.target_overlay().map(ViewId::as_str), Some("Quit"));
        assert!(!controller.is_overlay_open("Quit"));

        let hide = parked(&controller);
        controller.complete(hide[0]).unwrap();
        assert!(controller.is_overlay_open("Quit"));
        assert!(!controller.is_overlay_open("Slow"));
        assert_eq!(controller.target_overlay(), None);
    }

    #[test]
    fn waiting_on_closed_overlay_opens_at_once() {
        let mut controller = controller();
        let gone = InstanceId::new(99);
        let created =
            controller.open_overlay("Quit", Payload::none(), WaitFor::Instance(gone)).unwrap();
        assert!(created.is_some());

        let created = controller.open_overlay("Quit", Payload::none(), WaitFor::All).unwrap();
        assert_eq!(created, None);
        assert_eq!(controller.showing_overlays().len(), 1);
        assert_eq!(controller.ref_count("Quit"), 1);
    }

    #[test]
    fn stale_tokens_are_ignored() {
        let mut controller = controller();
        let overlay =
            controller.open_overlay("Slow", Payload::none(), WaitFor::Nothing).unwrap().unwrap();
        let first = parked(&controller)[0];

        controller.reshow(overlay, Payload::none()).unwrap();
        let second = parked(&controller)[0];
        assert!(!controller.complete(first).unwrap());
        assert!(controller.complete(second).unwrap());
        assert!(!controller.complete(second).unwrap());

        controller.close_overlay_instance(overlay).unwrap();
        let hide = parked(&controller)[0];
        assert!(controller.complete(hide).unwrap());
        assert!(!controller.complete(hide).unwrap());
        assert!(!controller.is_instance_open(overlay));
    }

    #[test]
    fn missing_component_reverts_load() {
        let mut controller = controller();
        let err = controller.change_location("Broken", Payload::none(), false).unwrap_err();
        assert_eq!(err, ViewError::MissingViewComponent(ViewId::new("Broken")));
        assert_eq!(controller.ref_count("Broken"), 0);
        assert_eq!(controller.live_instances(), 0);
        assert_eq!(controller.current_location(), None);
        assert_eq!(controller.host().destroyed, vec![1]);
    }

    #[test]
    fn missing_resource_creates_nothing() {
        let mut controller = controller();
        let err = controller.open_overlay("Gone", Payload::none(), WaitFor::Nothing).unwrap_err();
        assert!(matches!(err, ViewError::MissingResource { .. }));
        assert_eq!(controller.ref_count("Gone"), 0);
        assert!(controller.showing_overlays().is_empty());
    }

    #[test]
    fn preload_and_unload_balance() {
        let mut controller = controller();
        controller.preload("Title").unwrap();
        controller.preload("Title").unwrap();
        assert_eq!(controller.loaded_resource_count(), 1);

        assert!(!controller.unload("Title").unwrap());
        assert!(controller.unload("Title").unwrap());
        assert!(!controller.unload("Title").unwrap());
        assert_eq!(controller.loader().released, vec!["instant".to_string()]);

        controller.preload("Quit").unwrap();
        controller.preload("Title").unwrap();
        controller.unload_all();
        assert_eq!(controller.loaded_resource_count(), 0);
    }

    #[test]
    fn sibling_order_with_parent() {
        let mut controller = controller().with_view_parent(());
        controller.change_location("Title", Payload::none(), false).unwrap();
        controller.open_overlay("Quit", Payload::none(), WaitFor::Nothing).unwrap();

        assert_eq!(controller.host().orders, vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn no_order_without_parent() {
        let mut controller = controller();
        controller.change_location("Title", Payload::none(), false).unwrap();
        assert!(controller.host().orders.is_empty());
    }

    #[test]
    fn request_requires_active_view() {
        let mut controller = controller();
        let slow =
            controller.open_overlay("Slow", Payload::none(), WaitFor::Nothing).unwrap().unwrap();

        let close = || NavRequest::CloseInstance { instance: slow };
        assert!(!controller.request(slow, close()).unwrap());

        let show = parked(&controller)[0];
        controller.complete(show).unwrap();
        assert!(controller.request(slow, close()).unwrap());
        assert_eq!(controller.instance(slow).unwrap().state, ViewState::Hiding);
    }

    #[test]
    fn failed_overlay_target_still_closes_every_overlay() {
        let mut controller = controller();
        controller.open_overlay("Quit", Payload::none(), WaitFor::Nothing).unwrap();
        controller.open_overlay("Quit", Payload::none(), WaitFor::Nothing).unwrap();

        let err = controller.open_overlay("Gone", Payload::none(), WaitFor::All).unwrap_err();
        assert_eq!(
            err,
            ViewError::MissingResource { view: ViewId::new("Gone"), path: "missing".to_string() }
        );

        assert!(controller.showing_overlays().is_empty());
        assert_eq!(controller.target_overlay(), None);
        assert_eq!(controller.ref_count("Quit"), 0);
        assert_eq!(controller.ref_count("Gone"), 0);
        assert_eq!(controller.live_instances(), 0);
    }

    #[test]
    fn close_by_view_hides_every_match_after_failed_target() {
        let mut controller = controller();
        let slow =
            controller.open_overlay("Slow", Payload::none(), WaitFor::Nothing).unwrap().unwrap();
        let show = parked(&controller);
        controller.complete(show[0]).unwrap();
        controller.open_overlay("Quit", Payload::none(), WaitFor::Nothing).unwrap();
        controller.open_overlay("Quit", Payload::none(), WaitFor::Nothing).unwrap();

        let queued =
            controller.open_overlay("Broken", Payload::none(), WaitFor::Instance(slow)).unwrap();
        assert_eq!(queued, None);

        let err = controller.close_overlay("Quit").unwrap_err();
        assert_eq!(err, ViewError::MissingViewComponent(ViewId::new("Broken")));
        assert!(!controller.is_overlay_open("Quit"));
        assert_eq!(controller.ref_count("Quit"), 0);
        assert_eq!(controller.ref_count("Broken"), 0);

        let open = controller.showing_overlays();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, slow);
        assert_eq!(open[0].state, ViewState::Hiding);

        let hide = parked(&controller);
        assert!(controller.complete(hide[0]).unwrap());
        assert!(controller.showing_overlays().is_empty());
    }

    #[test]
    fn event_buffer_keeps_newest_when_capped() {
        let config = ControllerConfig::new().with_view("Title", "instant").with_event_capacity(3);
        let mut controller: Controller =
            ViewController::new(config, Loader::default(), Host::default());
        controller.change_location("Title", Payload::none(), false).unwrap();

        assert_eq!(controller.buffered_events(), 3);
        assert_eq!(controller.dropped_events(), 1);
        let kinds: Vec<ViewEventKind> = controller.drain_events().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            [ViewEventKind::ViewCreated, ViewEventKind::ShowStart, ViewEventKind::ShowComplete]
        );
        assert_eq!(controller.buffered_events(), 0);
    }

    #[test]
    fn send_to_unknown_instance() {
        let mut controller = controller();
        let err = controller.send(InstanceId::new(5), &Payload::none()).unwrap_err();
        assert_eq!(err, ViewError::UnknownInstance(InstanceId::new(5)));
    }
}
