//! Final state of a scenario run.

use ipframe_core::{EncapsulatorStats, SequencerEvent};

use crate::frame::{IpFrame, Transmission};

/// Everything an oracle can inspect once the bench is idle.
#[derive(Debug, Clone)]
pub struct World {
    sent: Vec<Transmission>,
    received: Vec<IpFrame>,
    stats: EncapsulatorStats,
    early_termination: bool,
    max_interframe_gap: Option<u64>,
    ticks: u64,
    events: Vec<(u64, SequencerEvent)>,
}

impl World {
    pub(crate) fn new(
        sent: Vec<Transmission>,
        received: Vec<IpFrame>,
        stats: EncapsulatorStats,
        early_termination: bool,
        max_interframe_gap: Option<u64>,
        ticks: u64,
        events: Vec<(u64, SequencerEvent)>,
    ) -> Self {
        Self { sent, received, stats, early_termination, max_interframe_gap, ticks, events }
    }

    /// Transmissions in send order.
    pub fn sent(&self) -> &[Transmission] {
        &self.sent
    }

    /// Frames in receive order.
    pub fn received(&self) -> &[IpFrame] {
        &self.received
    }

    /// Engine counters.
    pub fn stats(&self) -> EncapsulatorStats {
        self.stats
    }

    /// Engine alarm at the end of the run.
    pub fn early_termination(&self) -> bool {
        self.early_termination
    }

    /// Longest idle run between consecutive frames on the payload output.
    pub fn max_interframe_gap(&self) -> Option<u64> {
        self.max_interframe_gap
    }

    /// Ticks until idle.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sequencer events, tagged with their tick.
    pub fn events(&self) -> &[(u64, SequencerEvent)] {
        &self.events
    }
}
