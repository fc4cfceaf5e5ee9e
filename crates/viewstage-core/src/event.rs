//! Lifecycle events.
//!
//! Every controller stamps its events with its own [`ControllerId`] so that
//! observers of several controllers can tell them apart. Events are buffered
//! in the controller and handed out through
//! [`ViewController::drain_events`](crate::ViewController::drain_events).
//!
//! The buffer grows until drained unless
//! [`ControllerConfig::event_capacity`](crate::ControllerConfig::event_capacity)
//! is set, in which case the oldest events are dropped to make room.

use std::{
    collections::VecDeque,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    instance::InstanceId,
    view::{DisplayMode, ViewId},
};

static NEXT_CONTROLLER: AtomicU64 = AtomicU64::new(1);

/// Identifies the controller that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u64);

impl ControllerId {
    /// Wrap a raw identifier.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocate a process-unique identifier.
    pub fn next() -> Self {
        Self(NEXT_CONTROLLER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewEventKind {
    /// A location change or an overlay was requested. Not emitted for
    /// unregistered views or for requesting the current location again.
    ViewRequested,
    /// An instance was instantiated, parented, and created.
    ViewCreated,
    /// An instance started transitioning in.
    ShowStart,
    /// An instance finished transitioning in.
    ShowComplete,
    /// An instance started transitioning out.
    HideStart,
    /// An instance finished transitioning out and is about to be destroyed.
    HideComplete,
}

/// A lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEvent {
    /// Emitting controller.
    pub controller: ControllerId,
    /// What happened.
    pub kind: ViewEventKind,
    /// View the event refers to.
    pub view: ViewId,
    /// Display mode of the view.
    pub mode: DisplayMode,
    /// Instance involved; `None` for requests made before an instance exists.
    pub instance: Option<InstanceId>,
}

impl fmt::Display for ViewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {}", self.kind, self.view, self.mode)
    }
}

/// FIFO buffer of emitted events, optionally capped.
#[derive(Debug)]
pub(crate) struct EventLog {
    controller: ControllerId,
    pending: VecDeque<ViewEvent>,
    capacity: Option<usize>,
    dropped: u64,
}

impl EventLog {
    /// Buffer for `controller`. With a capacity, at least one event is kept.
    pub(crate) fn new(controller: ControllerId, capacity: Option<usize>) -> Self {
        Self { controller, pending: VecDeque::new(), capacity, dropped: 0 }
    }

    pub(crate) fn controller(&self) -> ControllerId {
        self.controller
    }

    pub(crate) fn emit(
        &mut self,
        kind: ViewEventKind,
        view: &ViewId,
        mode: DisplayMode,
        instance: Option<InstanceId>,
    ) {
        tracing::trace!(controller = self.controller.get(), ?kind, %view, %mode, "view event");
        if let Some(capacity) = self.capacity {
            while self.pending.len() >= capacity.max(1) && self.pending.pop_front().is_some() {
                if self.dropped == 0 {
                    tracing::warn!(
                        controller = self.controller.get(),
                        capacity,
                        "event buffer full, dropping oldest events"
                    );
                }
                self.dropped += 1;
            }
        }
        self.pending.push_back(ViewEvent {
            controller: self.controller,
            kind,
            view: view.clone(),
            mode,
            instance,
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Events discarded because the buffer was full.
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Remove and yield every buffered event in emission order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = ViewEvent> + '_ {
        self.pending.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_ids_are_unique() {
        let a = ControllerId::next();
        let b = ControllerId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn drain_preserves_order() {
        let mut log = EventLog::new(ControllerId::new(3), None);
        let title = ViewId::new("Title");
        log.emit(ViewEventKind::ViewRequested, &title, DisplayMode::Location, None);
        log.emit(
            ViewEventKind::ViewCreated,
            &title,
            DisplayMode::Location,
            Some(InstanceId::new(1)),
        );
        assert_eq!(log.len(), 2);

        let rendered: Vec<String> = log.drain().map(|event| event.to_string()).collect();
        assert_eq!(rendered, ["ViewRequested Title location", "ViewCreated Title location"]);
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn capped_log_drops_oldest() {
        let mut log = EventLog::new(ControllerId::new(4), Some(2));
        for view in ["Title", "LevelSelect", "Level"] {
            log.emit(ViewEventKind::ViewRequested, &ViewId::new(view), DisplayMode::Location, None);
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 1);

        let views: Vec<String> = log.drain().map(|event| event.view.to_string()).collect();
        assert_eq!(views, ["LevelSelect", "Level"]);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut log = EventLog::new(ControllerId::new(5), Some(0));
        let title = ViewId::new("Title");
        log.emit(ViewEventKind::ViewRequested, &title, DisplayMode::Overlay, None);
        log.emit(ViewEventKind::ViewCreated, &title, DisplayMode::Overlay, None);

        assert_eq!(log.len(), 1);
        assert_eq!(log.drain().next().map(|event| event.kind), Some(ViewEventKind::ViewCreated));
    }
}
