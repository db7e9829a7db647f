//! The encapsulation engine.
//!
//! [`Encapsulator`] owns both input ports, both output ports and the
//! sequencer between them. Producers and consumers interact with it only
//! through non-blocking handshakes; the driver calls [`Encapsulator::tick`]
//! once per clock step.
//!
//! ```
//! use std::net::Ipv4Addr;
//!
//! use ipframe_core::Encapsulator;
//! use ipframe_proto::{EthernetFields, HeaderDescriptor, IpFields, PayloadBeat, UdpFields};
//!
//! let mut engine = Encapsulator::default();
//! let header = HeaderDescriptor {
//!     eth: EthernetFields::default(),
//!     ip: IpFields::udp_v4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)),
//!     udp: UdpFields { source_port: 1, dest_port: 2, length: 11, checksum: 0 },
//! };
//!
//! engine.offer_header(header).unwrap();
//! engine.offer_beat(PayloadBeat::from_chunk(b"abc", true).unwrap()).unwrap();
//!
//! engine.tick();
//! assert_eq!(engine.take_header().map(|h| h.total_length), Some(31));
//! ```

use ipframe_proto::{HeaderDescriptor, IpHeaderDescriptor, PayloadBeat};
use tracing::trace;

use crate::{
    channel::Channel,
    config::EncapsulatorConfig,
    error::{Backpressure, ConfigError},
    latch::HeaderLatch,
    monitor::EncapsulatorStats,
    relay::PayloadRelay,
    sequencer::{FrameSequencer, SequencerEvent, SequencerState},
};

/// Streaming UDP to IP encapsulator.
#[derive(Debug, Clone)]
pub struct Encapsulator {
    config: EncapsulatorConfig,
    latch: HeaderLatch,
    header_out: Channel<IpHeaderDescriptor>,
    relay: PayloadRelay,
    sequencer: FrameSequencer,
    ticks: u64,
}

impl Default for Encapsulator {
    fn default() -> Self {
        Self::build(EncapsulatorConfig::default())
    }
}

impl Encapsulator {
    /// Create an engine with the given channel depths.
    pub fn new(config: EncapsulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EncapsulatorConfig) -> Self {
        Self {
            latch: HeaderLatch::new(),
            header_out: Channel::with_capacity(config.header_out_depth),
            relay: PayloadRelay::new(config.payload_in_depth, config.payload_out_depth),
            sequencer: FrameSequencer::new(),
            ticks: 0,
            config,
        }
    }

    /// Channel depths in use.
    pub fn config(&self) -> &EncapsulatorConfig {
        &self.config
    }

    /// The header input can take a descriptor this tick.
    pub fn header_ready(&self) -> bool {
        self.latch.is_ready()
    }

    /// The payload input can take a beat this tick.
    pub fn payload_ready(&self) -> bool {
        self.relay.input_ready()
    }

    /// Header input handshake.
    ///
    /// Hands the descriptor back if the latch is still holding the previous
    /// one.
    pub fn offer_header(
        &mut self,
        header: HeaderDescriptor,
    ) -> Result<(), Backpressure<HeaderDescriptor>> {
        self.latch.offer(header)?;
        trace!(udp_length = header.udp.length, "header latched");
        Ok(())
    }

    /// Payload input handshake.
    pub fn offer_beat(&mut self, beat: PayloadBeat) -> Result<(), Backpressure<PayloadBeat>> {
        self.relay.offer(beat)
    }

    /// Header output handshake.
    pub fn take_header(&mut self) -> Option<IpHeaderDescriptor> {
        self.header_out.try_recv()
    }

    /// Payload output handshake.
    pub fn take_beat(&mut self) -> Option<PayloadBeat> {
        self.relay.take()
    }

    /// A header or beat is waiting on an output.
    pub fn has_output(&self) -> bool {
        self.header_out.is_valid() || self.relay.output_valid()
    }

    /// Advance one clock step.
    pub fn tick(&mut self) -> Vec<SequencerEvent> {
        self.ticks += 1;
        self.sequencer.step(&mut self.latch, &mut self.header_out, &mut self.relay)
    }

    /// Steps taken so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// A header is latched or a frame is in progress.
    pub fn busy(&self) -> bool {
        self.latch.is_occupied() || !self.sequencer.is_idle()
    }

    /// Not busy and nothing buffered on any port.
    pub fn is_drained(&self) -> bool {
        !self.busy() && self.relay.in_flight() == 0 && self.header_out.is_empty()
    }

    /// Sticky early-termination alarm.
    pub fn early_termination(&self) -> bool {
        self.sequencer.monitor().early_termination()
    }

    /// Clear the early-termination alarm.
    pub fn clear_alarm(&mut self) {
        self.sequencer.monitor_mut().clear();
    }

    /// Running counters.
    pub fn stats(&self) -> EncapsulatorStats {
        self.sequencer.monitor().stats()
    }

    /// Sequencer state.
    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    /// Header of the frame currently being emitted.
    pub fn current_header(&self) -> Option<&HeaderDescriptor> {
        self.sequencer.current_header()
    }
}
