//! Fixed verification matrix.
//!
//! Nine cases, each run for payload lengths 1 through 17 under every
//! schedule in [`PauseSchedule::MATRIX`]. Every case except the first sends
//! two frames back to back: a first frame carrying the case's fault and a
//! clean second frame to a different host, which must come through intact
//! whatever happened to the first.

use std::{fmt, net::Ipv4Addr, ops::RangeInclusive};

use ipframe_core::EncapsulatorConfig;
use tracing::debug;

use crate::{
    error::HarnessError,
    frame::{Fault, FrameTemplate, IpFrame, UdpFrame, sequence_payload},
    model::tick_budget,
    pause::PauseSchedule,
    sink::SinkError,
    testbench::Testbench,
};

/// Payload lengths every case runs over.
pub const PAYLOAD_LENGTHS: RangeInclusive<usize> = 1..=17;

/// One verification case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixCase {
    /// One clean frame
    SingleFrame,
    /// Two clean frames back to back
    BackToBack,
    /// Error flag on the first frame
    ErrorFlag,
    /// Extra bytes past the first frame's declared length
    TrailingBytes(u8),
    /// Extra bytes and the error flag on the first frame
    TrailingBytesWithError(u8),
    /// First frame's payload cut short
    TruncatedPayload(u8),
}

impl MatrixCase {
    /// Every case, in run order.
    pub const ALL: [Self; 9] = [
        Self::SingleFrame,
        Self::BackToBack,
        Self::ErrorFlag,
        Self::TrailingBytes(1),
        Self::TrailingBytes(10),
        Self::TrailingBytesWithError(1),
        Self::TrailingBytesWithError(10),
        Self::TruncatedPayload(1),
        Self::TruncatedPayload(10),
    ];

    fn fault(self) -> Fault {
        match self {
            Self::SingleFrame | Self::BackToBack => Fault::None,
            Self::ErrorFlag => Fault::ErrorFlag,
            Self::TrailingBytes(count) => Fault::Trailing(count),
            Self::TrailingBytesWithError(count) => Fault::TrailingWithError(count),
            Self::TruncatedPayload(count) => Fault::Truncated(count),
        }
    }

    /// Length the first frame declares. A truncated frame declares `count`
    /// bytes more than the `payload_len` it actually sends.
    fn declared_len(self, payload_len: usize) -> usize {
        match self {
            Self::TruncatedPayload(count) => payload_len + usize::from(count),
            _ => payload_len,
        }
    }
}

impl fmt::Display for MatrixCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleFrame => f.write_str("single frame"),
            Self::BackToBack => f.write_str("back to back"),
            Self::ErrorFlag => f.write_str("error flag"),
            Self::TrailingBytes(count) => write!(f, "trailing bytes ({count})"),
            Self::TrailingBytesWithError(count) => write!(f, "trailing bytes with error ({count})"),
            Self::TruncatedPayload(count) => write!(f, "truncated payload ({count})"),
        }
    }
}

/// Outcome of a passing case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    /// Case run
    pub case: MatrixCase,
    /// Payload length used
    pub payload_len: usize,
    /// Schedule used
    pub schedule: PauseSchedule,
    /// Ticks until the bench went idle
    pub ticks: u64,
    /// Frames received, in order
    pub frames: Vec<IpFrame>,
}

/// Run one case and check its outcome.
pub fn run_case(
    case: MatrixCase,
    payload_len: usize,
    schedule: PauseSchedule,
    config: EncapsulatorConfig,
) -> Result<CaseReport, HarnessError> {
    let template = FrameTemplate::standard();
    let first = template.build(sequence_payload(case.declared_len(payload_len)));
    let second =
        template.with_dest_addr(Ipv4Addr::new(192, 168, 1, 102)).build(sequence_payload(payload_len));

    let sent = first.transmission().with_fault(case.fault());
    let mut transmissions = vec![sent.clone()];
    if case != MatrixCase::SingleFrame {
        transmissions.push(second.transmission());
    }

    let mut bench = Testbench::new(config, schedule)?;
    for tx in &transmissions {
        bench.send(tx);
    }
    let ticks = bench.run_until_idle(tick_budget(&transmissions))?;
    debug!(%case, payload_len, %schedule, ticks, "case idle");

    let mut frames = Vec::new();
    let received = receive(&mut bench, 0)?;
    match case {
        MatrixCase::SingleFrame | MatrixCase::BackToBack | MatrixCase::TrailingBytes(_) => {
            expect_frame(0, &received, &first, false)?;
        },
        MatrixCase::ErrorFlag | MatrixCase::TrailingBytesWithError(_) => {
            expect_frame(0, &received, &first, true)?;
        },
        MatrixCase::TruncatedPayload(_) => {
            let udp = received.to_udp()?;
            ensure(0, received.error, "truncated frame not flagged")?;
            ensure(0, udp.header == first.header, "truncated frame header altered")?;
            ensure(0, udp.payload == sent.payload, "truncated frame payload altered")?;
            ensure(0, bench.engine().early_termination(), "alarm not raised")?;
            bench.engine_mut().clear_alarm();
        },
    }
    frames.push(received);

    if case != MatrixCase::SingleFrame {
        let received = receive(&mut bench, 1)?;
        expect_frame(1, &received, &second, false)?;
        frames.push(received);
    }

    ensure(frames.len(), bench.recv() == Err(SinkError::Empty), "sink not empty")?;
    ensure(frames.len(), !bench.engine().early_termination(), "alarm raised")?;

    if case == MatrixCase::BackToBack && schedule == PauseSchedule::Never {
        ensure(1, bench.sink().max_interframe_gap() == Some(0), "idle tick between frames")?;
    }

    Ok(CaseReport { case, payload_len, schedule, ticks, frames })
}

fn receive(bench: &mut Testbench, index: usize) -> Result<IpFrame, HarnessError> {
    bench.recv().map_err(|e| HarnessError::Mismatch { index, detail: e.to_string() })
}

fn expect_frame(
    index: usize,
    received: &IpFrame,
    frame: &UdpFrame,
    error: bool,
) -> Result<(), HarnessError> {
    let udp = received.to_udp()?;
    if udp != *frame {
        return Err(HarnessError::Mismatch {
            index,
            detail: format!("expected {frame:?}, got {udp:?}"),
        });
    }
    ensure(
        index,
        received.header.total_length == frame.expected_total_length(),
        "wrong total length",
    )?;
    ensure(index, received.error == error, "wrong error flag")
}

fn ensure(index: usize, ok: bool, detail: &str) -> Result<(), HarnessError> {
    if ok { Ok(()) } else { Err(HarnessError::Mismatch { index, detail: detail.into() }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_case_once() {
        for case in MatrixCase::ALL {
            let report = run_case(case, 9, PauseSchedule::Never, EncapsulatorConfig::default());
            assert!(report.is_ok(), "{case}: {report:?}");
        }
    }

    #[test]
    fn back_to_back_reports_both_frames() {
        let report =
            run_case(MatrixCase::BackToBack, 3, PauseSchedule::Never, EncapsulatorConfig::default())
                .unwrap();

        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.frames[1].header.ip.dest_addr, Ipv4Addr::new(192, 168, 1, 102));
    }

    #[test]
    fn truncated_case_sends_every_byte_but_the_missing_tail() {
        for payload_len in [1, 3, 9, 10] {
            let report = run_case(
                MatrixCase::TruncatedPayload(10),
                payload_len,
                PauseSchedule::Never,
                EncapsulatorConfig::default(),
            )
            .unwrap();

            let frame = &report.frames[0];
            let expected: Vec<u8> = (0..payload_len as u8).collect();
            assert!(frame.error);
            assert_eq!(&frame.payload[8..], expected.as_slice());
            assert_eq!(usize::from(frame.header.total_length), 20 + 8 + payload_len + 10);
        }
    }
}
