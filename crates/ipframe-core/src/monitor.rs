//! Early-termination monitor.
//!
//! A frame ends early when the producer marks a beat `last` before delivering
//! the payload length its UDP header declared. The frame is still forwarded
//! in full; the monitor forces the error marker on the emitted final beat and
//! latches an alarm that stays set until the consumer clears it.

use ipframe_proto::PayloadBeat;
use tracing::warn;

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncapsulatorStats {
    /// Frames whose final beat has been emitted
    pub frames: u64,
    /// Frames that ended before their declared length
    pub truncated_frames: u64,
    /// Input beats dropped past the declared length
    pub trailing_beats_discarded: u64,
}

/// Sticky early-termination alarm plus counters.
#[derive(Debug, Clone, Default)]
pub struct ErrorMonitor {
    early_termination: bool,
    stats: EncapsulatorStats,
}

impl ErrorMonitor {
    /// Create a monitor with the alarm clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Police a frame's final beat against the bytes still owed.
    ///
    /// `remaining` is the declared payload not yet relayed before `beat`.
    /// Returns true, with the beat's error marker forced on, if the frame
    /// came up short.
    pub fn police_final(&mut self, beat: &mut PayloadBeat, remaining: usize) -> bool {
        if beat.len() >= remaining {
            return false;
        }

        warn!(remaining, delivered = beat.len(), "payload ended before declared length");
        beat.error = true;
        self.early_termination = true;
        self.stats.truncated_frames += 1;
        true
    }

    /// A beat past the declared length was dropped.
    pub fn record_discard(&mut self) {
        self.stats.trailing_beats_discarded += 1;
    }

    /// A frame's final beat was emitted.
    pub fn record_frame(&mut self) {
        self.stats.frames += 1;
    }

    /// Sticky alarm state.
    pub fn early_termination(&self) -> bool {
        self.early_termination
    }

    /// Reset the alarm. Counters are kept.
    pub fn clear(&mut self) {
        self.early_termination = false;
    }

    /// Counters so far.
    pub fn stats(&self) -> EncapsulatorStats {
        self.stats
    }
}
