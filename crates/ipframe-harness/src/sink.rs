//! Frame sink.
//!
//! Collects IP headers and payload beats from the engine's outputs and pairs
//! them up into [`IpFrame`]s. Every beat is logged with the tick it arrived
//! on, which is what the back-to-back gap check reads.

use std::collections::VecDeque;

use bytes::{BufMut, BytesMut};
use ipframe_core::Encapsulator;
use ipframe_proto::{IpHeaderDescriptor, PayloadBeat};
use thiserror::Error;
use tracing::trace;

use crate::{error::HarnessError, frame::IpFrame};

/// Why [`IpFrameSink::try_recv`] returned nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    /// No frame has been received.
    #[error("no frame received")]
    Empty,
    /// A frame is partially reassembled.
    #[error("frame still in progress")]
    InProgress,
}

/// One payload beat as seen by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatRecord {
    /// Tick the beat was taken on
    pub tick: u64,
    /// Valid bytes
    pub bytes: usize,
    /// Beat closed a frame
    pub last: bool,
}

/// Reassembles engine output.
#[derive(Debug, Clone, Default)]
pub struct IpFrameSink {
    headers: VecDeque<IpHeaderDescriptor>,
    partial: BytesMut,
    in_progress: bool,
    frames: VecDeque<IpFrame>,
    beat_log: Vec<BeatRecord>,
}

impl IpFrameSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt one header and one beat handshake.
    pub fn drain(&mut self, engine: &mut Encapsulator, tick: u64) -> Result<(), HarnessError> {
        if let Some(header) = engine.take_header() {
            self.headers.push_back(header);
        }
        if let Some(beat) = engine.take_beat() {
            self.absorb(beat, tick)?;
        }
        Ok(())
    }

    fn absorb(&mut self, beat: PayloadBeat, tick: u64) -> Result<(), HarnessError> {
        self.partial.put_slice(beat.bytes()?);
        self.in_progress = true;
        self.beat_log.push(BeatRecord { tick, bytes: beat.len(), last: beat.last });

        if beat.last {
            let header = self.headers.pop_front().ok_or(HarnessError::OrphanPayload)?;
            let payload = self.partial.split().freeze();
            trace!(tick, bytes = payload.len(), error = beat.error, "frame received");

            self.in_progress = false;
            self.frames.push_back(IpFrame { header, payload, error: beat.error });
        }
        Ok(())
    }

    /// Oldest complete frame.
    pub fn try_recv(&mut self) -> Result<IpFrame, SinkError> {
        match self.frames.pop_front() {
            Some(frame) => Ok(frame),
            None if self.in_progress => Err(SinkError::InProgress),
            None => Err(SinkError::Empty),
        }
    }

    /// No complete or partial frame is held.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && !self.in_progress
    }

    /// Every beat received so far.
    pub fn beat_log(&self) -> &[BeatRecord] {
        &self.beat_log
    }

    /// Longest run of empty ticks between one frame's final beat and the next
    /// frame's first beat. `None` until two frames have been received.
    pub fn max_interframe_gap(&self) -> Option<u64> {
        self.beat_log
            .windows(2)
            .filter(|pair| pair[0].last)
            .map(|pair| pair[1].tick.saturating_sub(pair[0].tick + 1))
            .max()
    }
}
