//! UDP header word.
//!
//! The UDP header is exactly one datapath word, so it is emitted as a single
//! full beat ahead of the payload. The layout is checked at compile time by
//! `zerocopy`; all fields are network byte order.

use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, network_endian::U16,
};

use crate::{
    beat::{BEAT_BYTES, PayloadBeat},
    errors::{ProtocolError, Result},
    header::UdpFields,
};

/// Size of the UDP header in bytes.
pub const UDP_HEADER_SIZE: usize = 8;

const _: () = assert!(UDP_HEADER_SIZE == BEAT_BYTES, "UDP header must fill exactly one beat");

/// On-wire UDP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct UdpHeaderWire {
    source_port: U16,
    dest_port: U16,
    length: U16,
    checksum: U16,
}

impl UdpHeaderWire {
    /// Lay out `fields` in network byte order.
    pub fn new(fields: &UdpFields) -> Self {
        Self {
            source_port: U16::new(fields.source_port),
            dest_port: U16::new(fields.dest_port),
            length: U16::new(fields.length),
            checksum: U16::new(fields.checksum),
        }
    }

    /// Parse the header off the front of a datagram, returning the fields and
    /// the remaining payload.
    pub fn parse(datagram: &[u8]) -> Result<(UdpFields, &[u8])> {
        let (wire, payload) = Self::read_from_prefix(datagram).map_err(|_| {
            ProtocolError::DatagramTooShort { len: datagram.len(), min: UDP_HEADER_SIZE }
        })?;
        Ok((wire.fields(), payload))
    }

    /// Host-order fields.
    pub fn fields(&self) -> UdpFields {
        UdpFields {
            source_port: self.source_port.get(),
            dest_port: self.dest_port.get(),
            length: self.length.get(),
            checksum: self.checksum.get(),
        }
    }

    /// Raw header bytes.
    pub fn to_array(&self) -> [u8; UDP_HEADER_SIZE] {
        let mut out = [0u8; UDP_HEADER_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// The header as a full payload beat.
    pub fn to_beat(&self, last: bool) -> PayloadBeat {
        PayloadBeat::word(self.to_array(), last)
    }
}
