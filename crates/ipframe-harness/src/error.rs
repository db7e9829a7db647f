//! Harness error types.

use ipframe_core::ConfigError;
use ipframe_proto::ProtocolError;
use thiserror::Error;

/// Failures raised while driving or checking the engine.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The engine rejected its configuration.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// Output could not be decoded.
    #[error("malformed output: {0}")]
    Protocol(#[from] ProtocolError),

    /// The bench did not go idle within the tick budget.
    #[error("not idle after {ticks} ticks")]
    Timeout {
        /// Budget that ran out
        ticks: u64,
    },

    /// A payload frame completed with no IP header to pair it with.
    #[error("payload frame completed without an IP header")]
    OrphanPayload,

    /// Received output differs from what was expected.
    #[error("frame {index}: {detail}")]
    Mismatch {
        /// Position of the frame in send order
        index: usize,
        /// What differed
        detail: String,
    },

    /// A scenario's oracle rejected the final state.
    #[error("scenario '{scenario}': {reason}")]
    Oracle {
        /// Scenario name
        scenario: String,
        /// Oracle's explanation
        reason: String,
    },
}
