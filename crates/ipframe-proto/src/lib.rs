//! Data model for the ipframe UDP/IP encapsulator.
//!
//! A UDP frame enters the encapsulator as two streams: one
//! [`HeaderDescriptor`] carrying every Ethernet, IP and UDP field in parallel,
//! and a sequence of [`PayloadBeat`]s carrying the datagram payload eight
//! bytes at a time. An IP frame leaves the same way: one
//! [`IpHeaderDescriptor`] with the computed total length, followed by beats
//! whose first word is the 8-byte UDP header.
//!
//! Header fields are opaque passthrough. The only field this crate knows how
//! to lay out on the wire is the UDP header word, which uses a `zerocopy`
//! big-endian layout so it can be cast straight out of a beat.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod beat;
pub mod errors;
pub mod header;
pub mod udp;

pub use beat::{BEAT_BYTES, KeepMask, PayloadBeat};
pub use errors::{ProtocolError, Result};
pub use header::{
    ETHERTYPE_IPV4, EthernetFields, HeaderDescriptor, IPPROTO_UDP, IpFields, IpHeaderDescriptor,
    MacAddr, UdpFields,
};
pub use udp::{UDP_HEADER_SIZE, UdpHeaderWire};
