//! Frame source.
//!
//! Headers and payload beats are queued separately and driven on separate
//! ports, so a header can run ahead of its payload exactly as it would from
//! independent upstream blocks.

use std::collections::VecDeque;

use ipframe_core::Encapsulator;
use ipframe_proto::{HeaderDescriptor, PayloadBeat};

use crate::frame::Transmission;

/// Drives queued transmissions into an engine.
#[derive(Debug, Clone, Default)]
pub struct UdpFrameSource {
    headers: VecDeque<HeaderDescriptor>,
    beats: VecDeque<PayloadBeat>,
}

impl UdpFrameSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transmission.
    pub fn send(&mut self, tx: &Transmission) {
        self.headers.push_back(tx.header);
        self.beats.extend(tx.beats());
    }

    /// Attempt one header and one beat handshake. Whatever the engine
    /// refuses stays at the front of its queue.
    pub fn drive(&mut self, engine: &mut Encapsulator) {
        let header = self.headers.pop_front().map(|header| engine.offer_header(header));
        if let Some(Err(rejected)) = header {
            self.headers.push_front(rejected.into_inner());
        }

        let beat = self.beats.pop_front().map(|beat| engine.offer_beat(beat));
        if let Some(Err(rejected)) = beat {
            self.beats.push_front(rejected.into_inner());
        }
    }

    /// Headers not yet accepted.
    pub fn pending_headers(&self) -> usize {
        self.headers.len()
    }

    /// Beats not yet accepted.
    pub fn pending_beats(&self) -> usize {
        self.beats.len()
    }

    /// Everything has been accepted.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.beats.is_empty()
    }
}
