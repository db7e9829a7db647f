//! Payload relay.
//!
//! Two channels with the sequencer in between. The producer fills the input
//! side, the consumer drains the output side, and the two never see each
//! other's readiness directly. A beat only leaves the input when an output
//! slot has already been reserved for it, so neither side's pauses can drop
//! or duplicate a beat.

use ipframe_proto::PayloadBeat;

use crate::{
    channel::{Channel, Permit},
    error::Backpressure,
};

/// Input and output payload channels.
#[derive(Debug, Clone)]
pub struct PayloadRelay {
    input: Channel<PayloadBeat>,
    output: Channel<PayloadBeat>,
}

impl PayloadRelay {
    /// Create a relay with the given channel depths.
    pub fn new(input_depth: usize, output_depth: usize) -> Self {
        Self {
            input: Channel::with_capacity(input_depth),
            output: Channel::with_capacity(output_depth),
        }
    }

    /// Producer side is ready.
    pub fn input_ready(&self) -> bool {
        self.input.is_ready()
    }

    /// Consumer side has a beat.
    pub fn output_valid(&self) -> bool {
        self.output.is_valid()
    }

    /// Beats buffered on either side.
    pub fn in_flight(&self) -> usize {
        self.input.len() + self.output.len()
    }

    /// Producer handshake.
    pub fn offer(&mut self, beat: PayloadBeat) -> Result<(), Backpressure<PayloadBeat>> {
        self.input.try_send(beat)
    }

    /// Consumer handshake.
    pub fn take(&mut self) -> Option<PayloadBeat> {
        self.output.try_recv()
    }

    /// Next input beat, left in place.
    pub fn peek(&self) -> Option<&PayloadBeat> {
        self.input.peek()
    }

    /// Reserve an output slot for a beat the sequencer generates itself.
    pub fn reserve_output(&mut self) -> Option<Permit<'_, PayloadBeat>> {
        self.output.reserve()
    }

    /// Pop the next input beat together with an output slot for it.
    ///
    /// Returns `None`, consuming nothing, unless both sides are ready.
    pub fn accept(&mut self) -> Option<(PayloadBeat, Permit<'_, PayloadBeat>)> {
        if !self.input.is_valid() {
            return None;
        }
        let permit = self.output.reserve()?;
        let beat = self.input.try_recv()?;
        Some((beat, permit))
    }

    /// Pop the next input beat without forwarding it.
    pub fn discard(&mut self) -> Option<PayloadBeat> {
        self.input.try_recv()
    }
}
