//! Error types for beat and header decoding.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while building or decoding beats and headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Not enough bytes to hold a UDP header.
    #[error("datagram too short: {len} bytes, need at least {min}")]
    DatagramTooShort {
        /// Bytes available
        len: usize,
        /// Bytes required
        min: usize,
    },

    /// A chunk handed to a beat is wider than the datapath.
    #[error("chunk of {len} bytes exceeds beat width of {width}")]
    ChunkTooWide {
        /// Chunk length
        len: usize,
        /// Beat width in bytes
        width: usize,
    },

    /// Valid lanes must start at lane 0 and be contiguous.
    #[error("keep mask {mask:#04x} is not contiguous from lane 0")]
    NonContiguousKeep {
        /// Offending mask bits
        mask: u8,
    },
}
