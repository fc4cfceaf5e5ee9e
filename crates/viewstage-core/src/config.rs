//! Controller configuration.

use serde::{Deserialize, Serialize};

use crate::view::ViewId;

/// One entry of the view registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRegistration {
    /// Registry key.
    pub id: ViewId,
    /// Path handed to the resource loader.
    pub resource_path: String,
}

impl ViewRegistration {
    /// Register `id` backed by the resource at `resource_path`.
    pub fn new(id: impl Into<ViewId>, resource_path: impl Into<String>) -> Self {
        Self { id: id.into(), resource_path: resource_path.into() }
    }
}

/// Settings for a [`ViewController`](crate::ViewController).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Location shown by `setup` when no explicit start is given.
    pub starting_location: Option<ViewId>,
    /// Registered views.
    pub views: Vec<ViewRegistration>,
    /// Log lifecycle activity at `info` instead of `debug`.
    pub debug: bool,
    /// Most lifecycle events buffered between drains. Unbounded when unset;
    /// the oldest events are dropped once the limit is reached.
    pub event_capacity: Option<usize>,
}

impl ControllerConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view.
    #[must_use]
    pub fn with_view(mut self, id: impl Into<ViewId>, resource_path: impl Into<String>) -> Self {
        self.views.push(ViewRegistration::new(id, resource_path));
        self
    }

    /// Set the default starting location.
    #[must_use]
    pub fn with_starting_location(mut self, id: impl Into<ViewId>) -> Self {
        self.starting_location = Some(id.into());
        self
    }

    /// Enable verbose lifecycle logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Cap the number of buffered lifecycle events.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_round_trip() {
        let config = ControllerConfig::new()
            .with_view("Title", "views/title")
            .with_view("Quit", "views/quit")
            .with_starting_location("Title")
            .with_debug(true)
            .with_event_capacity(64);

        let mut bytes = Vec::new();
        ciborium::into_writer(&config, &mut bytes).unwrap();
        let decoded: ControllerConfig = ciborium::from_reader(bytes.as_slice()).unwrap();

        assert_eq!(decoded, config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        #[derive(Serialize)]
        struct Partial {
            debug: bool,
        }

        let mut bytes = Vec::new();
        ciborium::into_writer(&Partial { debug: true }, &mut bytes).unwrap();
        let decoded: ControllerConfig = ciborium::from_reader(bytes.as_slice()).unwrap();

        assert!(decoded.debug);
        assert!(decoded.views.is_empty());
        assert_eq!(decoded.starting_location, None);
        assert_eq!(decoded.event_capacity, None);
    }
}
