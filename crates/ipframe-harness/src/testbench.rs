//! Tick loop tying a source, an engine and a sink together.
//!
//! Each tick runs in a fixed order: the sink drains the outputs, the engine
//! steps, then the source fills the inputs. Handshakes therefore always
//! observe the state the previous tick left behind, which is what a
//! registered ready/valid interface would see.

use ipframe_core::{Encapsulator, EncapsulatorConfig, SequencerEvent};

use crate::{
    error::HarnessError,
    frame::{IpFrame, Transmission},
    pause::{PauseSchedule, Pauser},
    sink::{IpFrameSink, SinkError},
    source::UdpFrameSource,
};

/// Ticks allowed before [`Testbench::run_until_idle`] gives up, unless the
/// caller sizes the budget itself.
pub const DEFAULT_TICK_BUDGET: u64 = 10_000;

/// A source, an engine and a sink under one pause schedule.
#[derive(Debug, Clone)]
pub struct Testbench {
    engine: Encapsulator,
    source: UdpFrameSource,
    sink: IpFrameSink,
    pauser: Pauser,
    now: u64,
    events: Vec<(u64, SequencerEvent)>,
}

impl Testbench {
    /// Build a bench around a fresh engine.
    pub fn new(config: EncapsulatorConfig, schedule: PauseSchedule) -> Result<Self, HarnessError> {
        Ok(Self {
            engine: Encapsulator::new(config)?,
            source: UdpFrameSource::new(),
            sink: IpFrameSink::new(),
            pauser: Pauser::new(schedule),
            now: 0,
            events: Vec::new(),
        })
    }

    /// Queue a transmission on the source.
    pub fn send(&mut self, tx: &Transmission) {
        self.source.send(tx);
    }

    /// Run one tick.
    pub fn step(&mut self) -> Result<(), HarnessError> {
        self.now += 1;
        let pauses = self.pauser.next_tick();

        if !pauses.sink {
            self.sink.drain(&mut self.engine, self.now)?;
        }

        let now = self.now;
        self.events.extend(self.engine.tick().into_iter().map(|event| (now, event)));

        if !pauses.source {
            self.source.drive(&mut self.engine);
        }
        Ok(())
    }

    /// Source exhausted and engine drained.
    pub fn is_idle(&self) -> bool {
        self.source.is_empty() && self.engine.is_drained()
    }

    /// Step until idle. Returns the number of ticks taken.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> Result<u64, HarnessError> {
        let start = self.now;
        while !self.is_idle() {
            if self.now - start >= max_ticks {
                return Err(HarnessError::Timeout { ticks: max_ticks });
            }
            self.step()?;
        }
        Ok(self.now - start)
    }

    /// Oldest received frame.
    pub fn recv(&mut self) -> Result<IpFrame, SinkError> {
        self.sink.try_recv()
    }

    /// The engine under test.
    pub fn engine(&self) -> &Encapsulator {
        &self.engine
    }

    /// The engine under test, for clearing its alarm.
    pub fn engine_mut(&mut self) -> &mut Encapsulator {
        &mut self.engine
    }

    /// The receiving side.
    pub fn sink(&self) -> &IpFrameSink {
        &self.sink
    }

    /// Every sequencer event, tagged with its tick.
    pub fn events(&self) -> &[(u64, SequencerEvent)] {
        &self.events
    }

    /// Ticks run so far.
    pub fn now(&self) -> u64 {
        self.now
    }
}
