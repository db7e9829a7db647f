//! Deterministic test bench for the ipframe encapsulator.
//!
//! The engine in `ipframe-core` never owns a clock, so everything here is a
//! plain loop: a [`UdpFrameSource`] feeds header descriptors and payload
//! beats, the engine ticks, and an [`IpFrameSink`] reassembles whatever comes
//! out. A [`PauseSchedule`] stalls either side to exercise backpressure, and
//! the seeded variant makes random stalls reproducible.
//!
//! Correctness is judged two ways: the fixed verification [`matrix`] that
//! walks payload lengths 1 through 17 under each pause mode, and the
//! [`ReferenceModel`], a pure function of the transmitted frames that the
//! engine's output must match exactly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod matrix;
pub mod model;
pub mod pause;
pub mod scenario;
pub mod sink;
pub mod source;
pub mod testbench;

pub use error::HarnessError;
pub use frame::{Fault, FrameSpec, FrameTemplate, IpFrame, Transmission, UdpFrame};
pub use matrix::{CaseReport, MatrixCase, run_case};
pub use model::{ReferenceModel, check_against_model, tick_budget};
pub use pause::PauseSchedule;
pub use sink::{BeatRecord, IpFrameSink, SinkError};
pub use source::UdpFrameSource;
pub use testbench::Testbench;
