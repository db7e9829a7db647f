//! Logical frames and their serialized forms.
//!
//! A [`UdpFrame`] is what a test means to send. A [`Transmission`] is what
//! the source actually drives, which may differ from the frame by a fault:
//! an error flag, extra trailing bytes, or a payload cut short of the
//! declared length. An [`IpFrame`] is what the sink reassembles.

use std::net::Ipv4Addr;

use arbitrary::Arbitrary;
use bytes::{BufMut, Bytes, BytesMut};
use ipframe_proto::{
    BEAT_BYTES, ETHERTYPE_IPV4, EthernetFields, HeaderDescriptor, IpFields, IpHeaderDescriptor,
    KeepMask, MacAddr, PayloadBeat, ProtocolError, UDP_HEADER_SIZE, UdpFields, UdpHeaderWire,
};

/// A UDP datagram plus the Ethernet and IPv4 fields it travels with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpFrame {
    /// Every header field, lengths and checksums included
    pub header: HeaderDescriptor,
    /// Datagram payload
    pub payload: Bytes,
}

impl UdpFrame {
    /// Total length the engine must put in the IPv4 header.
    pub fn expected_total_length(&self) -> u16 {
        (u16::from(self.header.ip.header_len_words) * 4).wrapping_add(self.header.udp.length)
    }

    /// The frame as sent, with no fault applied.
    pub fn transmission(&self) -> Transmission {
        Transmission { header: self.header, payload: self.payload.clone(), error: false }
    }
}

/// Field values shared by the frames of one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTemplate {
    eth: EthernetFields,
    ip: IpFields,
    source_port: u16,
    dest_port: u16,
}

impl FrameTemplate {
    /// Template with explicit fields.
    pub fn new(eth: EthernetFields, ip: IpFields, source_port: u16, dest_port: u16) -> Self {
        Self { eth, ip, source_port, dest_port }
    }

    /// The addressing used throughout the verification matrix:
    /// 192.168.1.100 port 1 to 192.168.1.101 port 2.
    pub fn standard() -> Self {
        let eth = EthernetFields {
            dest_mac: MacAddr::from_u64(0xDAD1_D2D3_D4D5),
            src_mac: MacAddr::from_u64(0x5A51_5253_5455),
            ethertype: ETHERTYPE_IPV4,
        };
        let ip = IpFields::udp_v4(Ipv4Addr::new(192, 168, 1, 100), Ipv4Addr::new(192, 168, 1, 101));
        Self::new(eth, ip, 1, 2)
    }

    /// Same template addressed to another host.
    #[must_use]
    pub fn with_dest_addr(mut self, dest_addr: Ipv4Addr) -> Self {
        self.ip.dest_addr = dest_addr;
        self
    }

    /// Build a frame around `payload`, filling in both lengths and both
    /// checksums.
    pub fn build(&self, payload: impl Into<Bytes>) -> UdpFrame {
        let payload = payload.into();
        let length = u16::try_from(payload.len() + UDP_HEADER_SIZE).unwrap_or(u16::MAX);

        let mut udp =
            UdpFields { source_port: self.source_port, dest_port: self.dest_port, length, checksum: 0 };
        udp.checksum = udp_checksum(&self.ip, &udp, &payload);

        let mut ip = self.ip;
        ip.header_checksum = ipv4_checksum(&ip, ip.header_len_bytes().wrapping_add(length));

        UdpFrame { header: HeaderDescriptor { eth: self.eth, ip, udp }, payload }
    }
}

/// `len` bytes counting up from zero.
pub fn sequence_payload(len: usize) -> Bytes {
    (0..len).map(|i| i as u8).collect()
}

/// Deviation from a well-formed transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Fault {
    /// Sent exactly as declared
    None,
    /// Error flag on the final beat
    ErrorFlag,
    /// Extra zero bytes past the declared length
    Trailing(u8),
    /// Extra zero bytes and the error flag
    TrailingWithError(u8),
    /// Payload cut short of the declared length
    Truncated(u8),
}

/// The header and payload a source actually drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// Header as offered. Its `udp.length` is the declared length.
    pub header: HeaderDescriptor,
    /// Payload bytes as sent
    pub payload: Bytes,
    /// Error flag on the final beat
    pub error: bool,
}

impl Transmission {
    /// Set the error flag on the final beat.
    #[must_use]
    pub fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// Append `count` zero bytes beyond the declared length.
    #[must_use]
    pub fn with_trailing_bytes(mut self, count: usize) -> Self {
        let mut buf = BytesMut::from(&self.payload[..]);
        buf.put_bytes(0, count);
        self.payload = buf.freeze();
        self
    }

    /// Drop the last `count` payload bytes, leaving the declared length alone.
    #[must_use]
    pub fn truncated(mut self, count: usize) -> Self {
        let keep = self.payload.len().saturating_sub(count);
        self.payload.truncate(keep);
        self
    }

    /// Apply `fault`.
    #[must_use]
    pub fn with_fault(self, fault: Fault) -> Self {
        match fault {
            Fault::None => self,
            Fault::ErrorFlag => self.with_error(true),
            Fault::Trailing(count) => self.with_trailing_bytes(usize::from(count)),
            Fault::TrailingWithError(count) => {
                self.with_trailing_bytes(usize::from(count)).with_error(true)
            },
            Fault::Truncated(count) => self.truncated(usize::from(count)),
        }
    }

    /// Payload split into beats. An empty payload still produces one
    /// (empty) final beat so the frame has an end.
    pub fn beats(&self) -> Vec<PayloadBeat> {
        if self.payload.is_empty() {
            return vec![PayloadBeat {
                data: [0; BEAT_BYTES],
                keep: KeepMask::empty(),
                last: true,
                error: self.error,
            }];
        }

        let count = self.payload.len().div_ceil(BEAT_BYTES);
        self.payload
            .chunks(BEAT_BYTES)
            .enumerate()
            .map(|(i, chunk)| {
                let last = i + 1 == count;
                let mut data = [0u8; BEAT_BYTES];
                data[..chunk.len()].copy_from_slice(chunk);
                PayloadBeat {
                    data,
                    keep: KeepMask::for_len(chunk.len()),
                    last,
                    error: last && self.error,
                }
            })
            .collect()
    }
}

/// Compact frame description for generated inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct FrameSpec {
    /// Payload bytes declared in the UDP header
    pub payload_len: u8,
    /// Deviation applied when sending
    pub fault: Fault,
    /// Last octet of the destination address
    pub host: u8,
}

impl FrameSpec {
    /// Frame built from `template` with a counting payload.
    pub fn frame(&self, template: &FrameTemplate) -> UdpFrame {
        template
            .with_dest_addr(Ipv4Addr::new(192, 168, 1, self.host))
            .build(sequence_payload(usize::from(self.payload_len)))
    }

    /// The frame as sent, fault applied.
    pub fn transmission(&self, template: &FrameTemplate) -> Transmission {
        self.frame(template).transmission().with_fault(self.fault)
    }
}

/// A reassembled output frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpFrame {
    /// IP header as emitted
    pub header: IpHeaderDescriptor,
    /// IP payload: the UDP header word followed by the datagram payload
    pub payload: Bytes,
    /// Error flag on the final beat
    pub error: bool,
}

impl IpFrame {
    /// Split the UDP header back out of the payload.
    pub fn to_udp(&self) -> Result<UdpFrame, ProtocolError> {
        let (udp, payload) = UdpHeaderWire::parse(&self.payload)?;
        Ok(UdpFrame {
            header: HeaderDescriptor { eth: self.header.eth, ip: self.header.ip, udp },
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

fn ones_complement(words: impl IntoIterator<Item = u16>) -> u16 {
    let mut sum: u32 = words.into_iter().map(u32::from).sum();
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

fn ipv4_checksum(ip: &IpFields, total_length: u16) -> u16 {
    let src = u32::from(ip.source_addr);
    let dst = u32::from(ip.dest_addr);

    ones_complement([
        u16::from(ip.version & 0xF) << 12
            | u16::from(ip.header_len_words & 0xF) << 8
            | u16::from(ip.dscp & 0x3F) << 2
            | u16::from(ip.ecn & 0x3),
        total_length,
        ip.identification,
        u16::from(ip.flags & 0x7) << 13 | (ip.fragment_offset & 0x1FFF),
        u16::from(ip.ttl) << 8 | u16::from(ip.protocol),
        (src >> 16) as u16,
        src as u16,
        (dst >> 16) as u16,
        dst as u16,
    ])
}

fn udp_checksum(ip: &IpFields, udp: &UdpFields, payload: &[u8]) -> u16 {
    let src = u32::from(ip.source_addr);
    let dst = u32::from(ip.dest_addr);

    let pseudo = [
        (src >> 16) as u16,
        src as u16,
        (dst >> 16) as u16,
        dst as u16,
        u16::from(ip.protocol),
        udp.length,
    ];
    let header = [udp.source_port, udp.dest_port, udp.length];
    let body = payload.chunks(2).map(|pair| match *pair {
        [hi, lo] => u16::from_be_bytes([hi, lo]),
        [hi] => u16::from_be_bytes([hi, 0]),
        _ => 0,
    });

    // Zero means "no checksum" on the wire.
    match ones_complement(pseudo.into_iter().chain(header).chain(body)) {
        0 => 0xFFFF,
        sum => sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_checksum_known_header() {
        let ip = IpFields::udp_v4(Ipv4Addr::new(192, 168, 0, 1), Ipv4Addr::new(192, 168, 0, 199));
        assert_eq!(ipv4_checksum(&ip, 0x73), 0xB861);
    }

    #[test]
    fn built_frame_lengths() {
        let frame = FrameTemplate::standard().build(sequence_payload(17));

        assert_eq!(frame.header.udp.length, 25);
        assert_eq!(frame.expected_total_length(), 45);
        assert_eq!(frame.header.ip.dest_addr, Ipv4Addr::new(192, 168, 1, 101));
        assert_eq!(frame.payload[16], 16);
    }

    #[test]
    fn custom_template_sets_ports() {
        let ip = IpFields::udp_v4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2));
        let template = FrameTemplate::new(EthernetFields::default(), ip, 5353, 53);
        let frame = template.build(sequence_payload(4));

        assert_eq!((frame.header.udp.source_port, frame.header.udp.dest_port), (5353, 53));
        assert_eq!(frame.header.ip.dest_addr, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(frame.expected_total_length(), 32);
    }

    #[test]
    fn udp_checksum_verifies_to_zero() {
        let frame = FrameTemplate::standard().build(sequence_payload(5));
        let header = frame.header;

        let mut words = vec![header.udp.checksum];
        words.extend(sequence_payload(5).chunks(2).map(|pair| match *pair {
            [hi, lo] => u16::from_be_bytes([hi, lo]),
            [hi] => u16::from_be_bytes([hi, 0]),
            _ => 0,
        }));
        let src = u32::from(header.ip.source_addr);
        let dst = u32::from(header.ip.dest_addr);
        words.extend([
            (src >> 16) as u16,
            src as u16,
            (dst >> 16) as u16,
            dst as u16,
            u16::from(header.ip.protocol),
            header.udp.length,
            header.udp.source_port,
            header.udp.dest_port,
            header.udp.length,
        ]);

        assert_eq!(ones_complement(words), 0);
    }

    #[test]
    fn beats_split_on_word_boundaries() {
        let tx = FrameTemplate::standard().build(sequence_payload(17)).transmission().with_error(true);
        let beats = tx.beats();

        assert_eq!(beats.iter().map(PayloadBeat::len).collect::<Vec<_>>(), vec![8, 8, 1]);
        assert_eq!(beats.iter().map(|b| b.last).collect::<Vec<_>>(), vec![false, false, true]);
        assert_eq!(beats.iter().map(|b| b.error).collect::<Vec<_>>(), vec![false, false, true]);
        assert_eq!(beats[2].bytes().unwrap(), &[16]);
    }

    #[test]
    fn empty_payload_has_one_final_beat() {
        let beats = FrameTemplate::standard().build(Bytes::new()).transmission().beats();

        assert_eq!(beats.len(), 1);
        assert!(beats[0].last);
        assert!(beats[0].is_empty());
    }

    #[test]
    fn faults_change_payload_not_header() {
        let frame = FrameTemplate::standard().build(sequence_payload(4));

        let trailing = frame.transmission().with_fault(Fault::Trailing(10));
        assert_eq!(trailing.payload.len(), 14);
        assert_eq!(&trailing.payload[4..], &[0; 10]);
        assert_eq!(trailing.header, frame.header);

        let truncated = frame.transmission().with_fault(Fault::Truncated(10));
        assert!(truncated.payload.is_empty());
        assert_eq!(truncated.header.udp.length, 12);
    }

    #[test]
    fn ip_frame_back_to_udp() {
        let frame = FrameTemplate::standard().build(sequence_payload(3));
        let mut payload = BytesMut::new();
        payload.put_slice(&UdpHeaderWire::new(&frame.header.udp).to_array());
        payload.put_slice(&frame.payload);

        let received = IpFrame {
            header: IpHeaderDescriptor {
                eth: frame.header.eth,
                ip: frame.header.ip,
                total_length: frame.expected_total_length(),
            },
            payload: payload.freeze(),
            error: false,
        };

        assert_eq!(received.to_udp().unwrap(), frame);
    }

    #[test]
    fn short_ip_payload_does_not_parse() {
        let frame = FrameTemplate::standard().build(sequence_payload(3));
        let received = IpFrame {
            header: IpHeaderDescriptor { eth: frame.header.eth, ip: frame.header.ip, total_length: 0 },
            payload: Bytes::from_static(&[0, 1, 0, 2]),
            error: true,
        };

        assert!(received.to_udp().is_err());
    }
}
