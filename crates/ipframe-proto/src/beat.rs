//! Payload beats: one datapath word per handshake.
//!
//! The datapath is eight byte lanes wide. Lane 0 carries the earliest byte in
//! stream order, and a [`KeepMask`] marks which lanes hold valid data. Every
//! beat of a frame is full except possibly the last one, whose valid lanes are
//! packed from lane 0 upwards.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Width of the datapath in bytes.
pub const BEAT_BYTES: usize = 8;

bitflags! {
    /// Per-lane byte validity for a [`PayloadBeat`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct KeepMask: u8 {
        /// Lane 0 (first byte of the word)
        const LANE0 = 1 << 0;
        /// Lane 1
        const LANE1 = 1 << 1;
        /// Lane 2
        const LANE2 = 1 << 2;
        /// Lane 3
        const LANE3 = 1 << 3;
        /// Lane 4
        const LANE4 = 1 << 4;
        /// Lane 5
        const LANE5 = 1 << 5;
        /// Lane 6
        const LANE6 = 1 << 6;
        /// Lane 7 (last byte of the word)
        const LANE7 = 1 << 7;
    }
}

impl KeepMask {
    /// Mask covering the first `len` lanes. Saturates at a full word.
    pub const fn for_len(len: usize) -> Self {
        if len >= BEAT_BYTES { Self::all() } else { Self::from_bits_retain((1u8 << len) - 1) }
    }

    /// Number of valid lanes.
    pub const fn byte_count(self) -> usize {
        self.bits().count_ones() as usize
    }

    /// True when the valid lanes start at lane 0 with no holes.
    pub fn is_contiguous(self) -> bool {
        let bits = u16::from(self.bits());
        bits & (bits + 1) == 0
    }
}

/// One word of payload moving across a ready/valid handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadBeat {
    /// Raw lanes. Lanes outside `keep` are don't-care.
    pub data: [u8; BEAT_BYTES],
    /// Which lanes of `data` are valid.
    pub keep: KeepMask,
    /// Final beat of the frame.
    pub last: bool,
    /// Upstream defect marker, meaningful on the final beat.
    pub error: bool,
}

impl PayloadBeat {
    /// Full-width beat.
    pub const fn word(data: [u8; BEAT_BYTES], last: bool) -> Self {
        Self { data, keep: KeepMask::all(), last, error: false }
    }

    /// Pack up to [`BEAT_BYTES`] bytes into a beat, low lanes first.
    pub fn from_chunk(chunk: &[u8], last: bool) -> Result<Self> {
        if chunk.len() > BEAT_BYTES {
            return Err(ProtocolError::ChunkTooWide { len: chunk.len(), width: BEAT_BYTES });
        }

        let mut data = [0u8; BEAT_BYTES];
        data[..chunk.len()].copy_from_slice(chunk);

        Ok(Self { data, keep: KeepMask::for_len(chunk.len()), last, error: false })
    }

    /// Set the error marker.
    #[must_use]
    pub const fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// Number of valid bytes.
    pub const fn len(&self) -> usize {
        self.keep.byte_count()
    }

    /// True when no lane is valid.
    pub const fn is_empty(&self) -> bool {
        self.keep.is_empty()
    }

    /// Valid bytes in stream order.
    ///
    /// Rejects masks with holes, which cannot be mapped onto a byte stream.
    pub fn bytes(&self) -> Result<&[u8]> {
        if !self.keep.is_contiguous() {
            return Err(ProtocolError::NonContiguousKeep { mask: self.keep.bits() });
        }
        Ok(&self.data[..self.len()])
    }

    /// Drop every lane at or beyond `len`.
    pub fn truncate_to(&mut self, len: usize) {
        self.keep &= KeepMask::for_len(len);
    }
}
