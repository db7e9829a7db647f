//! Engine configuration.

use crate::error::ConfigError;

/// Channel depths for an [`crate::Encapsulator`].
///
/// The header input side is always a single-slot latch; only the other three
/// ports are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncapsulatorConfig {
    /// Payload beats buffered between the producer and the relay
    pub payload_in_depth: usize,
    /// Payload beats buffered between the relay and the consumer. Two slots
    /// let the relay keep one beat per tick flowing while the consumer's
    /// ready toggles.
    pub payload_out_depth: usize,
    /// IP headers buffered for the consumer
    pub header_out_depth: usize,
}

impl Default for EncapsulatorConfig {
    fn default() -> Self {
        Self { payload_in_depth: 1, payload_out_depth: 2, header_out_depth: 1 }
    }
}

impl EncapsulatorConfig {
    /// Reject depths that would leave a port permanently not-ready.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let depths = [
            ("payload input", self.payload_in_depth),
            ("payload output", self.payload_out_depth),
            ("header output", self.header_out_depth),
        ];

        match depths.into_iter().find(|&(_, depth)| depth == 0) {
            Some((channel, _)) => Err(ConfigError::ZeroDepth { channel }),
            None => Ok(()),
        }
    }
}
