//! Frame sequencer.
//!
//! Coordinates the latch, the relay and the monitor so that one frame at a
//! time goes out: IP header first, then the UDP header word, then the payload,
//! with no beat of the next frame allowed in between.
//!
//! # State Machine
//!
//! ```text
//!            header latched,
//!            header out ready            output ready
//! ┌──────┐ ───────────────> ┌────────────┐ ──────────> ┌──────────────┐
//! │ Idle │                  │ EmitHeader │             │ DrainPayload │
//! └──────┘ <─┐              └────────────┘             └──────────────┘
//!     ^      │                     │ declared 0           │        │
//!     │      │ last beat out       v                      │        │ declared
//!     │      └───────────── ┌─────────────────┐ <─────────┘        │ length
//!     │                     │ DiscardTrailing │    last beat out   │ reached
//!     └──────────────────── └─────────────────┘ <──────────────────┘
//!         sender's last
//! ```
//!
//! Whenever a frame completes, the sequencer re-arbitrates in the same step:
//! if the next header is already latched it is emitted immediately, so
//! back-to-back frames leave without an idle beat between them.
//!
//! The sequencer owns the in-flight frame and the [`ErrorMonitor`]. Each
//! [`FrameSequencer::step`] returns the events it produced, for the driver to
//! log or assert on.

use ipframe_proto::{BEAT_BYTES, HeaderDescriptor, IpHeaderDescriptor, PayloadBeat};
use tracing::{debug, trace};

use crate::{channel::Channel, latch::HeaderLatch, length, monitor::ErrorMonitor, relay::PayloadRelay};

/// Observable sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// No frame owned
    Idle,
    /// IP header sent, UDP header word not yet sent
    EmitHeader,
    /// Relaying payload beats
    DrainPayload,
    /// Declared length reached; dropping input up to the sender's last beat
    DiscardTrailing,
}

/// What a step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    /// A latched header was consumed and its IP header emitted.
    HeaderEmitted {
        /// Computed IPv4 total length
        total_length: u16,
        /// Declared payload bytes
        declared: usize,
    },

    /// The UDP header word went out on the payload channel.
    UdpHeaderEmitted,

    /// A payload beat went out.
    BeatForwarded {
        /// Valid bytes in the emitted beat
        bytes: usize,
        /// Beat closes the frame
        last: bool,
    },

    /// An input beat past the declared length was dropped.
    BeatDiscarded {
        /// Valid bytes in the dropped beat
        bytes: usize,
    },

    /// The frame's final beat went out.
    FrameCompleted {
        /// Payload bytes emitted, excluding the UDP header
        delivered: usize,
        /// Error marker on the final beat
        error: bool,
        /// Frame ended before its declared length
        truncated: bool,
    },
}

/// Bookkeeping for the frame currently owned by the sequencer.
#[derive(Debug, Clone)]
struct FrameContext {
    header: HeaderDescriptor,
    /// Declared payload bytes not yet relayed
    remaining: usize,
    /// Payload bytes relayed so far
    delivered: usize,
}

impl FrameContext {
    fn new(header: HeaderDescriptor) -> Self {
        Self { remaining: header.declared_payload_len(), header, delivered: 0 }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    EmitHeader(FrameContext),
    DrainPayload(FrameContext),
    DiscardTrailing {
        frame: FrameContext,
        /// Final output beat, released when the sender's last beat arrives
        held: PayloadBeat,
    },
}

/// Frame sequencer state machine.
#[derive(Debug, Clone)]
pub struct FrameSequencer {
    phase: Phase,
    monitor: ErrorMonitor,
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSequencer {
    /// Create an idle sequencer.
    pub fn new() -> Self {
        Self { phase: Phase::Idle, monitor: ErrorMonitor::new() }
    }

    /// Current state.
    pub fn state(&self) -> SequencerState {
        match self.phase {
            Phase::Idle => SequencerState::Idle,
            Phase::EmitHeader(_) => SequencerState::EmitHeader,
            Phase::DrainPayload(_) => SequencerState::DrainPayload,
            Phase::DiscardTrailing { .. } => SequencerState::DiscardTrailing,
        }
    }

    /// No frame is owned.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Header of the frame in flight.
    pub fn current_header(&self) -> Option<&HeaderDescriptor> {
        match &self.phase {
            Phase::Idle => None,
            Phase::EmitHeader(frame) | Phase::DrainPayload(frame) => Some(&frame.header),
            Phase::DiscardTrailing { frame, .. } => Some(&frame.header),
        }
    }

    /// Early-termination monitor.
    pub fn monitor(&self) -> &ErrorMonitor {
        &self.monitor
    }

    /// Early-termination monitor, for clearing the alarm.
    pub fn monitor_mut(&mut self) -> &mut ErrorMonitor {
        &mut self.monitor
    }

    /// Advance one tick.
    ///
    /// Moves at most one beat onto the payload output and at most one header
    /// onto the header output.
    pub fn step(
        &mut self,
        latch: &mut HeaderLatch,
        header_out: &mut Channel<IpHeaderDescriptor>,
        relay: &mut PayloadRelay,
    ) -> Vec<SequencerEvent> {
        let mut events = Vec::new();

        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Idle => Self::start(latch, header_out, &mut events),
            Phase::EmitHeader(frame) => Self::emit_udp_header(frame, relay, &mut events),
            Phase::DrainPayload(frame) => match self.drain(frame, relay, &mut events) {
                Phase::Idle => Self::start(latch, header_out, &mut events),
                next => next,
            },
            Phase::DiscardTrailing { frame, held } => {
                match self.discard_trailing(frame, held, relay, &mut events) {
                    Phase::Idle => Self::start(latch, header_out, &mut events),
                    next => next,
                }
            },
        };

        events
    }

    fn start(
        latch: &mut HeaderLatch,
        header_out: &mut Channel<IpHeaderDescriptor>,
        events: &mut Vec<SequencerEvent>,
    ) -> Phase {
        if !latch.is_occupied() {
            return Phase::Idle;
        }
        let Some(permit) = header_out.reserve() else {
            return Phase::Idle;
        };
        let Some(header) = latch.take() else {
            return Phase::Idle;
        };

        let ip = length::ip_header(&header);
        let frame = FrameContext::new(header);
        debug!(
            total_length = ip.total_length,
            declared = frame.remaining,
            dest = %header.ip.dest_addr,
            "frame started"
        );

        permit.send(ip);
        events.push(SequencerEvent::HeaderEmitted {
            total_length: ip.total_length,
            declared: frame.remaining,
        });
        Phase::EmitHeader(frame)
    }

    fn emit_udp_header(
        frame: FrameContext,
        relay: &mut PayloadRelay,
        events: &mut Vec<SequencerEvent>,
    ) -> Phase {
        if frame.remaining == 0 {
            // Nothing to relay: the UDP header word itself closes the frame
            // once the sender's last beat shows up.
            let mut held = length::udp_word(&frame.header);
            held.last = true;
            return Phase::DiscardTrailing { frame, held };
        }

        let Some(permit) = relay.reserve_output() else {
            return Phase::EmitHeader(frame);
        };
        permit.send(length::udp_word(&frame.header));
        events.push(SequencerEvent::UdpHeaderEmitted);
        Phase::DrainPayload(frame)
    }

    fn drain(
        &mut self,
        mut frame: FrameContext,
        relay: &mut PayloadRelay,
        events: &mut Vec<SequencerEvent>,
    ) -> Phase {
        let Some(next) = relay.peek() else {
            return Phase::DrainPayload(frame);
        };

        // A carved beat is held, not emitted, so it takes no output slot.
        if frame.remaining <= BEAT_BYTES && !next.last {
            let Some(mut held) = relay.discard() else {
                return Phase::DrainPayload(frame);
            };
            held.truncate_to(frame.remaining);
            trace!(kept = held.len(), "declared length reached before last beat");
            frame.delivered += held.len();
            held.last = true;
            return Phase::DiscardTrailing { frame, held };
        }

        let Some((mut beat, permit)) = relay.accept() else {
            return Phase::DrainPayload(frame);
        };

        if frame.remaining <= BEAT_BYTES {
            beat.truncate_to(frame.remaining);
        }

        if beat.last {
            let truncated = self.monitor.police_final(&mut beat, frame.remaining);
            frame.delivered += beat.len();
            permit.send(beat);
            events.push(SequencerEvent::BeatForwarded { bytes: beat.len(), last: true });
            return self.finish(&frame, beat.error, truncated, events);
        }

        trace!(bytes = beat.len(), remaining = frame.remaining, "beat forwarded");
        frame.remaining -= beat.len();
        frame.delivered += beat.len();
        permit.send(beat);
        events.push(SequencerEvent::BeatForwarded { bytes: beat.len(), last: false });
        Phase::DrainPayload(frame)
    }

    fn discard_trailing(
        &mut self,
        frame: FrameContext,
        mut held: PayloadBeat,
        relay: &mut PayloadRelay,
        events: &mut Vec<SequencerEvent>,
    ) -> Phase {
        let Some(next) = relay.peek() else {
            return Phase::DiscardTrailing { frame, held };
        };

        if !next.last {
            if let Some(dropped) = relay.discard() {
                trace!(bytes = dropped.len(), "trailing beat dropped");
                self.monitor.record_discard();
                events.push(SequencerEvent::BeatDiscarded { bytes: dropped.len() });
            }
            return Phase::DiscardTrailing { frame, held };
        }

        // The sender's last beat frees the held one; it needs an output slot.
        let Some((sender_last, permit)) = relay.accept() else {
            return Phase::DiscardTrailing { frame, held };
        };

        self.monitor.record_discard();
        events.push(SequencerEvent::BeatDiscarded { bytes: sender_last.len() });

        held.error = sender_last.error;
        permit.send(held);
        events.push(SequencerEvent::BeatForwarded { bytes: held.len(), last: true });
        self.finish(&frame, held.error, false, events)
    }

    fn finish(
        &mut self,
        frame: &FrameContext,
        error: bool,
        truncated: bool,
        events: &mut Vec<SequencerEvent>,
    ) -> Phase {
        self.monitor.record_frame();
        debug!(delivered = frame.delivered, error, truncated, "frame completed");
        events.push(SequencerEvent::FrameCompleted { delivered: frame.delivered, error, truncated });
        Phase::Idle
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use ipframe_proto::{EthernetFields, IpFields, UdpFields};

    use super::*;

    struct Ports {
        latch: HeaderLatch,
        header_out: Channel<IpHeaderDescriptor>,
        relay: PayloadRelay,
    }

    impl Ports {
        fn new() -> Self {
            Self {
                latch: HeaderLatch::new(),
                header_out: Channel::with_capacity(1),
                relay: PayloadRelay::new(4, 2),
            }
        }

        fn step(&mut self, seq: &mut FrameSequencer) -> Vec<SequencerEvent> {
            seq.step(&mut self.latch, &mut self.header_out, &mut self.relay)
        }
    }

    fn header(declared: u16) -> HeaderDescriptor {
        HeaderDescriptor {
            eth: EthernetFields::default(),
            ip: IpFields::udp_v4(Ipv4Addr::new(192, 168, 1, 100), Ipv4Addr::new(192, 168, 1, 101)),
            udp: UdpFields { source_port: 1, dest_port: 2, length: declared + 8, checksum: 0 },
        }
    }

    fn chunk(len: usize, last: bool) -> PayloadBeat {
        let bytes: Vec<u8> = (0..len as u8).collect();
        PayloadBeat::from_chunk(&bytes, last).unwrap()
    }

    #[test]
    fn idle_without_header() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.relay.offer(chunk(3, true)).unwrap();

        assert!(ports.step(&mut seq).is_empty());
        assert_eq!(seq.state(), SequencerState::Idle);
        assert_eq!(ports.relay.peek(), Some(&chunk(3, true)));
    }

    #[test]
    fn single_beat_frame() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.latch.offer(header(3)).unwrap();
        ports.relay.offer(chunk(3, true)).unwrap();

        let events = ports.step(&mut seq);
        assert_eq!(events, vec![SequencerEvent::HeaderEmitted { total_length: 31, declared: 3 }]);
        assert_eq!(seq.state(), SequencerState::EmitHeader);
        assert_eq!(ports.header_out.try_recv().map(|h| h.total_length), Some(31));

        let events = ports.step(&mut seq);
        assert_eq!(events, vec![SequencerEvent::UdpHeaderEmitted]);
        assert_eq!(seq.state(), SequencerState::DrainPayload);

        let events = ports.step(&mut seq);
        assert_eq!(
            events,
            vec![
                SequencerEvent::BeatForwarded { bytes: 3, last: true },
                SequencerEvent::FrameCompleted { delivered: 3, error: false, truncated: false },
            ]
        );
        assert!(seq.is_idle());

        let udp = ports.relay.take().unwrap();
        assert_eq!(udp.bytes().unwrap(), &[0, 1, 0, 2, 0, 11, 0, 0]);
        assert_eq!(ports.relay.take(), Some(chunk(3, true)));
    }

    #[test]
    fn next_header_starts_on_completion_tick() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.latch.offer(header(2)).unwrap();
        ports.relay.offer(chunk(2, true)).unwrap();

        ports.step(&mut seq);
        ports.header_out.try_recv().unwrap();
        ports.latch.offer(header(5)).unwrap();
        ports.step(&mut seq);
        ports.relay.take().unwrap();

        let events = ports.step(&mut seq);
        assert_eq!(
            events.last(),
            Some(&SequencerEvent::HeaderEmitted { total_length: 33, declared: 5 })
        );
        assert_eq!(seq.state(), SequencerState::EmitHeader);
        assert!(ports.latch.is_ready());
    }

    #[test]
    fn stalled_output_consumes_nothing() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.latch.offer(header(20)).unwrap();
        for _ in 0..3 {
            ports.relay.offer(chunk(8, false)).unwrap();
        }

        ports.step(&mut seq);
        ports.step(&mut seq);
        ports.step(&mut seq);
        // UDP word + one payload beat fill the two output slots.
        assert!(ports.step(&mut seq).is_empty());
        assert_eq!(ports.relay.in_flight(), 4);
    }

    #[test]
    fn short_frame_is_flagged() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.latch.offer(header(10)).unwrap();
        ports.relay.offer(chunk(4, true)).unwrap();

        ports.step(&mut seq);
        ports.step(&mut seq);
        let events = ports.step(&mut seq);

        assert_eq!(
            events.last(),
            Some(&SequencerEvent::FrameCompleted { delivered: 4, error: true, truncated: true })
        );
        assert!(seq.monitor().early_termination());
        ports.relay.take().unwrap();
        assert!(ports.relay.take().unwrap().error);
    }

    #[test]
    fn trailing_bytes_are_carved() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.latch.offer(header(3)).unwrap();
        ports.relay.offer(chunk(8, false)).unwrap();
        ports.relay.offer(chunk(8, false)).unwrap();
        ports.relay.offer(chunk(2, true).with_error(true)).unwrap();

        let mut events = Vec::new();
        for _ in 0..6 {
            events.extend(ports.step(&mut seq));
        }

        assert_eq!(
            events.last(),
            Some(&SequencerEvent::FrameCompleted { delivered: 3, error: true, truncated: false })
        );
        assert!(!seq.monitor().early_termination());
        assert_eq!(seq.monitor().stats().trailing_beats_discarded, 2);

        ports.relay.take().unwrap();
        let last = ports.relay.take().unwrap();
        assert_eq!(last.bytes().unwrap(), &[0, 1, 2]);
        assert!(last.last);
        assert!(last.error);
    }

    #[test]
    fn carve_proceeds_while_output_is_full() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.latch.offer(header(12)).unwrap();
        ports.relay.offer(chunk(8, false)).unwrap();
        ports.relay.offer(chunk(8, false)).unwrap();
        ports.relay.offer(chunk(8, true)).unwrap();

        ports.step(&mut seq);
        ports.step(&mut seq);
        ports.step(&mut seq);
        // UDP word and the first beat fill both output slots.
        assert_eq!(ports.relay.in_flight(), 4);

        ports.step(&mut seq);
        assert_eq!(seq.state(), SequencerState::DiscardTrailing);
        assert_eq!(ports.relay.in_flight(), 3);

        assert!(ports.step(&mut seq).is_empty());
        ports.relay.take().unwrap();
        ports.relay.take().unwrap();

        let events = ports.step(&mut seq);
        assert_eq!(
            events.last(),
            Some(&SequencerEvent::FrameCompleted { delivered: 12, error: false, truncated: false })
        );
        let last = ports.relay.take().unwrap();
        assert_eq!(last.bytes().unwrap(), &[0, 1, 2, 3]);
        assert!(last.last);
    }

    #[test]
    fn zero_length_payload_closes_on_udp_word() {
        let mut seq = FrameSequencer::new();
        let mut ports = Ports::new();
        ports.latch.offer(header(0)).unwrap();
        ports.relay.offer(chunk(4, true)).unwrap();

        ports.step(&mut seq);
        assert_eq!(seq.current_header().map(|h| h.udp.length), Some(8));
        ports.step(&mut seq);
        assert_eq!(seq.state(), SequencerState::DiscardTrailing);
        ports.step(&mut seq);

        assert!(seq.is_idle());
        let word = ports.relay.take().unwrap();
        assert!(word.last);
        assert_eq!(word.len(), 8);
        assert_eq!(ports.relay.take(), None);
    }
}
