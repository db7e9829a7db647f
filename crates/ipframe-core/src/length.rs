//! Header rewriting.
//!
//! The only computed field is the IPv4 total length. Everything else is
//! copied through untouched, including both checksums.

use ipframe_proto::{HeaderDescriptor, IpHeaderDescriptor, PayloadBeat, UdpHeaderWire};

/// IPv4 total length: header bytes plus the declared UDP length.
///
/// Wraps at 16 bits. Upstream guarantees sane lengths; out-of-range input is
/// not diagnosed here.
pub fn total_length(header: &HeaderDescriptor) -> u16 {
    header.ip.header_len_bytes().wrapping_add(header.udp.length)
}

/// Output header for `header`.
pub fn ip_header(header: &HeaderDescriptor) -> IpHeaderDescriptor {
    IpHeaderDescriptor { eth: header.eth, ip: header.ip, total_length: total_length(header) }
}

/// First IP payload word: the UDP header.
pub fn udp_word(header: &HeaderDescriptor) -> PayloadBeat {
    UdpHeaderWire::new(&header.udp).to_beat(false)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use ipframe_proto::{EthernetFields, IpFields, MacAddr, UdpFields};
    use proptest::prelude::*;

    use super::*;

    fn header(ihl: u8, udp_length: u16) -> HeaderDescriptor {
        let mut ip = IpFields::udp_v4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2));
        ip.header_len_words = ihl;
        ip.header_checksum = 0xBEEF;
        HeaderDescriptor {
            eth: EthernetFields {
                dest_mac: MacAddr::from_u64(0xDAD1_D2D3_D4D5),
                src_mac: MacAddr::from_u64(0x5A51_5253_5455),
                ethertype: 0x0800,
            },
            ip,
            udp: UdpFields { source_port: 1, dest_port: 2, length: udp_length, checksum: 0x1234 },
        }
    }

    #[test]
    fn total_length_adds_ip_header() {
        assert_eq!(total_length(&header(5, 9)), 29);
        assert_eq!(total_length(&header(15, 8)), 68);
    }

    #[test]
    fn ip_header_copies_everything_else() {
        let input = header(5, 25);
        let output = ip_header(&input);

        assert_eq!(output.eth, input.eth);
        assert_eq!(output.ip, input.ip);
        assert_eq!(output.ip.header_checksum, 0xBEEF);
        assert_eq!(output.total_length, 45);
    }

    #[test]
    fn udp_word_carries_udp_fields() {
        let beat = udp_word(&header(5, 25));

        assert_eq!(beat.bytes().unwrap(), &[0, 1, 0, 2, 0, 25, 0x12, 0x34]);
        assert!(!beat.last);
    }

    proptest! {
        #[test]
        fn total_length_invariant(ihl in 5u8..16, udp_length in any::<u16>()) {
            let h = header(ihl, udp_length);
            prop_assert_eq!(
                total_length(&h),
                (u16::from(ihl) * 4).wrapping_add(udp_length)
            );
        }
    }
}
