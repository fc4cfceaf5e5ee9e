//! Deterministic simulation harness for viewstage testing.
//!
//! In-memory implementations of the [`ResourceLoader`] and [`SceneHost`]
//! collaborators, scripted views with seeded transition timing, a reference
//! model for model-based tests, and a scenario builder with mandatory
//! oracles.
//!
//! [`ResourceLoader`]: viewstage_core::ResourceLoader
//! [`SceneHost`]: viewstage_core::SceneHost

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod scenario;
pub mod scripted;
pub mod sim;
pub mod sim_host;

pub use model::{
    ModelController, ModelWait, ObservableState, Operation, OperationResult, VIEWS, view_name,
};
pub use scripted::{Hook, Journal, JournalEntry, Parked, Script, ScriptedView, Timing, TimingPlan};
pub use sim::{Sim, SimBuilder, SimController};
pub use sim_host::{SimHost, SimLoader, SimResource, SimVisual, ViewFactory};
