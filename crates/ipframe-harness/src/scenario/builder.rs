//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use ipframe_core::EncapsulatorConfig;
use tracing::debug;

use crate::{
    error::HarnessError,
    frame::{Transmission, UdpFrame},
    model::tick_budget,
    pause::PauseSchedule,
    scenario::{OracleFn, World},
    sink::SinkError,
    testbench::Testbench,
};

/// Scenario builder.
///
/// Queue transmissions and pick a schedule. Must call `.oracle()` to get a
/// [`RunnableScenario`] that can be executed.
pub struct Scenario {
    name: String,
    config: EncapsulatorConfig,
    schedule: PauseSchedule,
    transmissions: Vec<Transmission>,
    tick_budget: Option<u64>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: EncapsulatorConfig::default(),
            schedule: PauseSchedule::Never,
            transmissions: Vec::new(),
            tick_budget: None,
        }
    }

    /// Use non-default channel depths.
    pub fn config(mut self, config: EncapsulatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Stall the source or sink.
    pub fn pauses(mut self, schedule: PauseSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Send a frame as-is.
    pub fn frame(self, frame: &UdpFrame) -> Self {
        self.send(frame.transmission())
    }

    /// Send a transmission, faults and all.
    pub fn send(mut self, tx: Transmission) -> Self {
        self.transmissions.push(tx);
        self
    }

    /// Override the tick budget.
    pub fn tick_budget(mut self, ticks: u64) -> Self {
        self.tick_budget = Some(ticks);
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Sends every transmission, runs the bench until idle, collects the
    /// received frames, then hands the final state to the oracle.
    pub fn run(self) -> Result<(), HarnessError> {
        let Scenario { name, config, schedule, transmissions, tick_budget: budget } =
            self.scenario;

        let mut bench = Testbench::new(config, schedule)?;
        for tx in &transmissions {
            bench.send(tx);
        }
        let ticks = bench.run_until_idle(budget.unwrap_or_else(|| tick_budget(&transmissions)))?;
        debug!(scenario = %name, ticks, "scenario idle");

        let mut received = Vec::new();
        loop {
            match bench.recv() {
                Ok(frame) => received.push(frame),
                Err(SinkError::Empty) => break,
                Err(e @ SinkError::InProgress) => {
                    return Err(HarnessError::Mismatch {
                        index: received.len(),
                        detail: e.to_string(),
                    });
                },
            }
        }

        let world = World::new(
            transmissions,
            received,
            bench.engine().stats(),
            bench.engine().early_termination(),
            bench.sink().max_interframe_gap(),
            ticks,
            bench.events().to_vec(),
        );

        (self.oracle)(&world).map_err(|reason| HarnessError::Oracle { scenario: name, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameTemplate, sequence_payload};

    #[test]
    fn scenario_requires_oracle() {
        // This should compile - oracle provided
        let _scenario = Scenario::new("test").oracle(Box::new(|_world| Ok(())));

        // This should NOT compile - no oracle
        // let scenario = Scenario::new("test");
        // scenario.run(); // ERROR: no method `run` on type `Scenario`
    }

    #[test]
    fn oracle_sees_received_frames() {
        let frame = FrameTemplate::standard().build(sequence_payload(6));

        let result = Scenario::new("one frame")
            .frame(&frame)
            .oracle(Box::new(|world| {
                assert_eq!(world.sent().len(), 1);
                assert_eq!(world.received().len(), 1);
                Ok(())
            }))
            .run();

        assert!(result.is_ok(), "scenario should succeed: {result:?}");
    }

    #[test]
    fn oracle_failure_names_scenario() {
        let result = Scenario::new("always fails")
            .oracle(Box::new(|_world| Err("nope".to_string())))
            .run();

        match result {
            Err(HarnessError::Oracle { scenario, reason }) => {
                assert_eq!(scenario, "always fails");
                assert_eq!(reason, "nope");
            },
            other => panic!("expected oracle failure, got {other:?}"),
        }
    }
}
