//! Reference model of the view controller.
//!
//! The model tracks only what is observable once every transition has
//! completed synchronously: the current location, the last location, the
//! open overlays with their instance numbers, and per-view reference counts.
//! Model-based tests drive the model and a real controller with immediate
//! timing through the same [`Operation`] sequence and compare the
//! [`ObservableState`] after every step.

use std::collections::BTreeMap;

/// Registered views of the model world. Indices past the end name an
/// unregistered view.
pub const VIEWS: [&str; 4] = ["Title", "LevelSelect", "Level", "Quit"];

/// Name of the view at `index`, or an unregistered name.
pub fn view_name(index: u8) -> &'static str {
    VIEWS.get(usize::from(index)).copied().unwrap_or("Unregistered")
}

/// What an overlay open waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelWait {
    /// Open right away.
    Nothing,
    /// Close the newest overlay first.
    Newest,
    /// Close every overlay first.
    All,
}

/// One step of a generated sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Change the location.
    ChangeLocation {
        /// Index into [`VIEWS`].
        view: u8,
        /// Do not wait for the current location to hide.
        immediate: bool,
    },
    /// Open an overlay.
    OpenOverlay {
        /// Index into [`VIEWS`].
        view: u8,
        /// What to close first.
        wait: ModelWait,
    },
    /// Close every overlay of a view.
    CloseOverlay {
        /// Index into [`VIEWS`].
        view: u8,
    },
    /// Close the newest overlay, if any.
    CloseNewest,
    /// Close every overlay.
    CloseAll,
    /// Drop one resource reference.
    Unload {
        /// Index into [`VIEWS`].
        view: u8,
    },
    /// Drop every resource reference.
    UnloadAll,
    /// Take a resource reference without instantiating.
    Preload {
        /// Index into [`VIEWS`].
        view: u8,
    },
    /// Advance one frame.
    Tick,
}

/// Outcome class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Accepted (including silent no-ops).
    Ok,
    /// Rejected because the view is not registered.
    InvalidView,
}

impl OperationResult {
    /// True for [`OperationResult::Ok`].
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

/// State compared between the model and the real controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservableState {
    /// Instance number and view of the current location.
    pub current: Option<(u64, String)>,
    /// View of the previous location.
    pub last: Option<String>,
    /// Open overlays, oldest first.
    pub overlays: Vec<(u64, String)>,
    /// Reference count per registered view.
    pub ref_counts: BTreeMap<String, u32>,
}

/// Synchronous reference implementation.
#[derive(Debug, Clone)]
pub struct ModelController {
    current: Option<(u64, String)>,
    last: Option<String>,
    overlays: Vec<(u64, String)>,
    ref_counts: BTreeMap<String, u32>,
    next_instance: u64,
}

impl Default for ModelController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelController {
    /// Nothing shown, nothing loaded.
    pub fn new() -> Self {
        Self {
            current: None,
            last: None,
            overlays: Vec::new(),
            ref_counts: VIEWS.iter().map(|view| ((*view).to_string(), 0)).collect(),
            next_instance: 1,
        }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::ChangeLocation { view, .. } => {
                let Some(view) = registered(*view) else {
                    return OperationResult::InvalidView;
                };
                self.change_location(view);
            },
            Operation::OpenOverlay { view, wait } => {
                let Some(view) = registered(*view) else {
                    return OperationResult::InvalidView;
                };
                self.open_overlay(view, *wait);
            },
            Operation::CloseOverlay { view } => {
                let Some(view) = registered(*view) else {
                    return OperationResult::InvalidView;
                };
                let matching: Vec<u64> = self
                    .overlays
                    .iter()
                    .rev()
                    .filter(|(_, open)| open == view)
                    .map(|(id, _)| *id)
                    .collect();
                for id in matching {
                    self.destroy_overlay(id);
                }
            },
            Operation::CloseNewest => {
                if let Some((id, _)) = self.overlays.last().cloned() {
                    self.destroy_overlay(id);
                }
            },
            Operation::CloseAll => {
                let snapshot: Vec<u64> = self.overlays.iter().map(|(id, _)| *id).collect();
                for id in snapshot {
                    self.destroy_overlay(id);
                }
            },
            Operation::Unload { view } => {
                let Some(view) = registered(*view) else {
                    return OperationResult::InvalidView;
                };
                self.release(view);
            },
            Operation::UnloadAll => self.ref_counts.values_mut().for_each(|count| *count = 0),
            Operation::Preload { view } => {
                let Some(view) = registered(*view) else {
                    return OperationResult::InvalidView;
                };
                self.acquire(view);
            },
            Operation::Tick => {},
        }
        OperationResult::Ok
    }

    /// Snapshot for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            current: self.current.clone(),
            last: self.last.clone(),
            overlays: self.overlays.clone(),
            ref_counts: self.ref_counts.clone(),
        }
    }

    /// Live instances per view.
    pub fn live_counts(&self) -> BTreeMap<String, u32> {
        let mut counts: BTreeMap<String, u32> =
            VIEWS.iter().map(|view| ((*view).to_string(), 0)).collect();
        let live = self.current.iter().chain(self.overlays.iter());
        for (_, view) in live {
            *counts.entry(view.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn change_location(&mut self, view: &str) {
        if self.current.as_ref().is_some_and(|(_, current)| current == view) {
            return;
        }
        if let Some((_, previous)) = self.current.take() {
            self.release(&previous);
            self.last = Some(previous);
        }
        let id = self.create(view);
        self.current = Some((id, view.to_string()));
    }

    fn open_overlay(&mut self, view: &str, wait: ModelWait) {
        let closing: Vec<u64> = match wait {
            ModelWait::Nothing => Vec::new(),
            ModelWait::Newest => self.overlays.last().map(|(id, _)| *id).into_iter().collect(),
            ModelWait::All => self.overlays.iter().map(|(id, _)| *id).collect(),
        };

        let Some((&first, rest)) = closing.split_first() else {
            self.push_overlay(view);
            return;
        };

        // The queued overlay appears as soon as the first close finishes; the
        // remaining closes follow.
        self.destroy_overlay(first);
        self.push_overlay(view);
        for id in rest {
            self.destroy_overlay(*id);
        }
    }

    fn push_overlay(&mut self, view: &str) {
        let id = self.create(view);
        self.overlays.push((id, view.to_string()));
    }

    fn destroy_overlay(&mut self, id: u64) {
        let Some(index) = self.overlays.iter().position(|(open, _)| *open == id) else {
            return;
        };
        let (_, view) = self.overlays.remove(index);
        self.release(&view);
    }

    fn create(&mut self, view: &str) -> u64 {
        self.acquire(view);
        let id = self.next_instance;
        self.next_instance += 1;
        id
    }

    fn acquire(&mut self, view: &str) {
        *self.ref_counts.entry(view.to_string()).or_insert(0) += 1;
    }

    fn release(&mut self, view: &str) {
        if let Some(count) = self.ref_counts.get_mut(view) {
            *count = count.saturating_sub(1);
        }
    }
}

fn registered(index: u8) -> Option<&'static str> {
    VIEWS.get(usize::from(index)).copied()
}
