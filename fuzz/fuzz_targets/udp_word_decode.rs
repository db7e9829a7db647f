//! Parses arbitrary bytes as a UDP header and checks that re-encoding the
//! fields reproduces the input word.

#![no_main]

use ipframe_proto::{UDP_HEADER_SIZE, UdpHeaderWire};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match UdpHeaderWire::parse(data) {
        Ok((fields, payload)) => {
            assert_eq!(payload.len(), data.len() - UDP_HEADER_SIZE);
            let wire = UdpHeaderWire::new(&fields);
            assert_eq!(&wire.to_array()[..], &data[..UDP_HEADER_SIZE]);

            let beat = wire.to_beat(true);
            assert_eq!(beat.bytes().ok(), Some(&data[..UDP_HEADER_SIZE]));
        },
        Err(_) => assert!(data.len() < UDP_HEADER_SIZE),
    }
});
