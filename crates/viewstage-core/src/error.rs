//! Error types for view lifecycle operations.

use thiserror::Error;

use crate::{
    instance::{InstanceId, ViewState},
    view::ViewId,
};

/// Errors returned by the controller and view instances.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewError {
    /// The identifier does not name a registered view.
    #[error("invalid view: {0} is not registered")]
    InvalidView(ViewId),

    /// The instantiated visual has no view behavior attached.
    #[error("missing view component on {0}")]
    MissingViewComponent(ViewId),

    /// The resource loader could not provide the view's backing resource.
    #[error("resource {path:?} for view {view} could not be loaded")]
    MissingResource {
        /// View being loaded.
        view: ViewId,
        /// Configured resource path.
        path: String,
    },

    /// No live instance has this identifier.
    #[error("unknown view instance {0}")]
    UnknownInstance(InstanceId),

    /// Lifecycle operation attempted in the wrong state.
    #[error("invalid state for {operation} on {instance}: {state:?}")]
    InvalidState {
        /// Instance the operation targeted.
        instance: InstanceId,
        /// State the instance was in.
        state: ViewState,
        /// Operation that was attempted.
        operation: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            ViewError::InvalidView(ViewId::new("Nope")).to_string(),
            "invalid view: Nope is not registered"
        );
        assert_eq!(
            ViewError::InvalidState {
                instance: InstanceId::new(4),
                state: ViewState::Hiding,
                operation: "show",
            }
            .to_string(),
            "invalid state for show on #4: Hiding"
        );
    }
}
