//! Reference model.
//!
//! The model knows nothing about beats, channels or ticks. Given one
//! transmission it states the single IP frame the engine must emit for it:
//!
//! - the IP header carries the input's Ethernet and IPv4 fields and a total
//!   length of `ihl * 4 + udp.length`, wrapping at 16 bits
//! - the payload is the UDP header word followed by at most the declared
//!   number of payload bytes
//! - a payload shorter than declared is forwarded as-is, flagged as an
//!   error, and raises the alarm
//! - otherwise the error flag is whatever the sender put on its final beat
//!
//! Comparing the engine against the model under random pause schedules is
//! what pins down pause invariance.

use bytes::{BufMut, BytesMut};
use ipframe_core::EncapsulatorConfig;
use ipframe_proto::{IpHeaderDescriptor, UDP_HEADER_SIZE};
use tracing::debug;

use crate::{
    error::HarnessError,
    frame::{IpFrame, Transmission},
    pause::PauseSchedule,
    sink::SinkError,
    testbench::Testbench,
};

/// Pure model of the encapsulator.
#[derive(Debug, Clone, Default)]
pub struct ReferenceModel {
    alarm: bool,
    frames: u64,
    truncated_frames: u64,
}

impl ReferenceModel {
    /// Create a model with the alarm clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame the engine must emit for `tx`.
    pub fn encapsulate(&mut self, tx: &Transmission) -> IpFrame {
        let header = tx.header;
        let declared = header.declared_payload_len();
        let truncated = tx.payload.len() < declared;
        let kept = tx.payload.len().min(declared);

        let mut payload = BytesMut::with_capacity(UDP_HEADER_SIZE + kept);
        payload.put_u16(header.udp.source_port);
        payload.put_u16(header.udp.dest_port);
        payload.put_u16(header.udp.length);
        payload.put_u16(header.udp.checksum);
        payload.put_slice(&tx.payload[..kept]);

        self.frames += 1;
        if truncated {
            self.alarm = true;
            self.truncated_frames += 1;
        }

        IpFrame {
            header: IpHeaderDescriptor {
                eth: header.eth,
                ip: header.ip,
                total_length: (u16::from(header.ip.header_len_words) * 4)
                    .wrapping_add(header.udp.length),
            },
            payload: payload.freeze(),
            error: truncated || tx.error,
        }
    }

    /// Sticky early-termination alarm.
    pub fn alarm(&self) -> bool {
        self.alarm
    }

    /// Reset the alarm.
    pub fn clear_alarm(&mut self) {
        self.alarm = false;
    }

    /// Frames modelled so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames that came up short.
    pub fn truncated_frames(&self) -> u64 {
        self.truncated_frames
    }
}

/// A tick budget generous enough for `transmissions` under any schedule.
pub fn tick_budget(transmissions: &[Transmission]) -> u64 {
    let beats: usize = transmissions.iter().map(|tx| tx.beats().len()).sum();
    64 + 16 * (beats + 2 * transmissions.len()) as u64
}

/// Run `transmissions` through a fresh engine and compare every output frame,
/// the alarm and the counters against the model.
pub fn check_against_model(
    config: EncapsulatorConfig,
    schedule: PauseSchedule,
    transmissions: &[Transmission],
) -> Result<(), HarnessError> {
    let mut bench = Testbench::new(config, schedule)?;
    for tx in transmissions {
        bench.send(tx);
    }
    let ticks = bench.run_until_idle(tick_budget(transmissions))?;
    debug!(frames = transmissions.len(), ticks, %schedule, "bench idle");

    let mut model = ReferenceModel::new();
    for (index, tx) in transmissions.iter().enumerate() {
        let expected = model.encapsulate(tx);
        let actual = bench
            .recv()
            .map_err(|e| HarnessError::Mismatch { index, detail: e.to_string() })?;

        if actual != expected {
            return Err(HarnessError::Mismatch {
                index,
                detail: format!("expected {expected:?}, got {actual:?}"),
            });
        }
    }

    let index = transmissions.len();
    if let Ok(extra) = bench.recv() {
        return Err(HarnessError::Mismatch { index, detail: format!("unexpected {extra:?}") });
    }
    if bench.recv() == Err(SinkError::InProgress) {
        return Err(HarnessError::Mismatch { index, detail: "partial frame left".into() });
    }

    let engine = bench.engine();
    if engine.early_termination() != model.alarm() {
        return Err(HarnessError::Mismatch {
            index,
            detail: format!("alarm {} but model says {}", engine.early_termination(), model.alarm()),
        });
    }

    let stats = engine.stats();
    if (stats.frames, stats.truncated_frames) != (model.frames(), model.truncated_frames()) {
        return Err(HarnessError::Mismatch {
            index,
            detail: format!(
                "counted {} frames ({} truncated), model has {} ({})",
                stats.frames,
                stats.truncated_frames,
                model.frames(),
                model.truncated_frames()
            ),
        });
    }

    Ok(())
}
