//! Parallel header descriptors.
//!
//! A [`HeaderDescriptor`] is what the producer hands the encapsulator: every
//! Ethernet, IPv4 and UDP field as a separate value. An
//! [`IpHeaderDescriptor`] is what comes out: the same Ethernet and IPv4 fields
//! plus the derived IPv4 total length. UDP fields leave the header channel and
//! travel in-band as the first payload word.
//!
//! None of these fields are validated. Checksums are whatever the producer
//! computed upstream.

use std::{fmt, net::Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::udp::UDP_HEADER_SIZE;

/// EtherType for IPv4.
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// IP protocol number for UDP.
pub const IPPROTO_UDP: u8 = 0x11;

/// 48-bit MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Build from the low 48 bits of `value`, most significant octet first.
    pub const fn from_u64(value: u64) -> Self {
        let b = value.to_be_bytes();
        Self([b[2], b[3], b[4], b[5], b[6], b[7]])
    }

    /// The address as an integer.
    pub const fn to_u64(self) -> u64 {
        let [a, b, c, d, e, f] = self.0;
        u64::from_be_bytes([0, 0, a, b, c, d, e, f])
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Ethernet fields carried alongside the IP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EthernetFields {
    /// Destination MAC
    pub dest_mac: MacAddr,
    /// Source MAC
    pub src_mac: MacAddr,
    /// EtherType
    pub ethertype: u16,
}

/// IPv4 header fields, minus the total length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpFields {
    /// Version (4 bits)
    pub version: u8,
    /// Header length in 32-bit words (4 bits)
    pub header_len_words: u8,
    /// DSCP (6 bits)
    pub dscp: u8,
    /// ECN (2 bits)
    pub ecn: u8,
    /// Identification
    pub identification: u16,
    /// Flags (3 bits)
    pub flags: u8,
    /// Fragment offset (13 bits)
    pub fragment_offset: u16,
    /// Time to live
    pub ttl: u8,
    /// Protocol number
    pub protocol: u8,
    /// Header checksum, computed upstream
    pub header_checksum: u16,
    /// Source address
    pub source_addr: Ipv4Addr,
    /// Destination address
    pub dest_addr: Ipv4Addr,
}

impl IpFields {
    /// A 20-byte IPv4 header carrying UDP between two hosts, don't-fragment
    /// set, TTL 64.
    pub const fn udp_v4(source_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> Self {
        Self {
            version: 4,
            header_len_words: 5,
            dscp: 0,
            ecn: 0,
            identification: 0,
            flags: 0b010,
            fragment_offset: 0,
            ttl: 64,
            protocol: IPPROTO_UDP,
            header_checksum: 0,
            source_addr,
            dest_addr,
        }
    }

    /// Header length in bytes.
    pub const fn header_len_bytes(&self) -> u16 {
        (self.header_len_words as u16) * 4
    }
}

/// UDP header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UdpFields {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub dest_port: u16,
    /// Declared datagram length: 8-byte header plus payload
    pub length: u16,
    /// Checksum, computed upstream
    pub checksum: u16,
}

/// Everything the producer knows about a UDP frame before its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderDescriptor {
    /// Ethernet fields
    pub eth: EthernetFields,
    /// IPv4 fields
    pub ip: IpFields,
    /// UDP fields
    pub udp: UdpFields,
}

impl HeaderDescriptor {
    /// Payload bytes the producer promised, i.e. `udp.length - 8`.
    ///
    /// A `udp.length` shorter than the UDP header declares no payload.
    pub fn declared_payload_len(&self) -> usize {
        usize::from(self.udp.length).saturating_sub(UDP_HEADER_SIZE)
    }
}

/// IP header as emitted by the encapsulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpHeaderDescriptor {
    /// Ethernet fields
    pub eth: EthernetFields,
    /// IPv4 fields
    pub ip: IpFields,
    /// IPv4 total length
    pub total_length: u16,
}
