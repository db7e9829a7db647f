//! Scenario tests with a mandatory oracle.
//!
//! A [`Scenario`] describes what to send and under which pause schedule. It
//! cannot be run until an oracle is attached, so every scenario ends with an
//! explicit check of the final [`World`].

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::World;

/// Verifies the final state of a scenario.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
