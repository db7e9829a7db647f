//! ipframe encapsulator core
//!
//! Pure state machine logic that turns a UDP header descriptor plus a payload
//! beat stream into an IP header descriptor plus an IP payload beat stream.
//! Nothing here performs I/O or owns a clock.
//!
//! # Architecture
//!
//! The engine follows a synchronous dataflow model. Every port is a bounded
//! [`Channel`] with non-blocking `try_send` / `try_recv`, and the whole engine
//! advances by exactly one step per [`Encapsulator::tick`]. A port that is
//! full is "not ready"; a port that is empty is "not valid". Backpressure is
//! nothing more than a producer finding a port full.
//!
//! Because the caller owns the clock, the same engine runs unchanged under a
//! deterministic test bench with arbitrary pause schedules on either side.
//!
//! # Components
//!
//! - [`latch`]: Header latch (one descriptor in flight on the input side)
//! - [`length`]: IP total length derivation and UDP header word
//! - [`relay`]: Payload beat relay between the input and output channels
//! - [`monitor`]: Early-termination detection and the sticky alarm
//! - [`sequencer`]: Frame sequencer state machine
//! - [`encapsulator`]: The engine that owns all of the above
//! - [`channel`]: Bounded ready/valid channel
//! - [`config`]: Channel depths
//! - [`error`]: Error types

pub mod channel;
pub mod config;
pub mod encapsulator;
pub mod error;
pub mod latch;
pub mod length;
pub mod monitor;
pub mod relay;
pub mod sequencer;

pub use channel::{Channel, Permit};
pub use config::EncapsulatorConfig;
pub use encapsulator::Encapsulator;
pub use error::{Backpressure, ConfigError};
pub use monitor::{EncapsulatorStats, ErrorMonitor};
pub use sequencer::{FrameSequencer, SequencerEvent, SequencerState};
