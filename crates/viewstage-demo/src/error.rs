//! Demo error type.

use thiserror::Error;
use viewstage_core::ViewError;

/// Errors that stop the demo.
#[derive(Debug, Error)]
pub enum DemoError {
    /// Reading commands or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The controller rejected an operation.
    #[error("view error: {0}")]
    View(#[from] ViewError),
}
