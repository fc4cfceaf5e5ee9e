//! Scenario testing with mandatory oracles.
//!
//! A [`Scenario`] lists the views to register and the steps to run against a
//! simulated controller. It cannot be run until an oracle is attached, so
//! every scenario ends with an explicit check of the final [`World`].

pub mod builder;
pub mod oracle;
pub mod world;

pub use builder::{RunnableScenario, Scenario, Step, Target};
pub use world::World;

/// Verifies the final world of a scenario.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
