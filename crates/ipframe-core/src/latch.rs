//! Header latch.
//!
//! Single slot on the header input side. A descriptor sits here from the
//! moment its handshake completes until the sequencer is free to start the
//! frame, which lets the next frame's header arrive while the current frame
//! is still draining.

use ipframe_proto::HeaderDescriptor;

use crate::error::Backpressure;

/// One-deep holding register for header descriptors.
#[derive(Debug, Clone, Default)]
pub struct HeaderLatch {
    slot: Option<HeaderDescriptor>,
}

impl HeaderLatch {
    /// Create an empty latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready half of the handshake.
    pub fn is_ready(&self) -> bool {
        self.slot.is_none()
    }

    /// A descriptor is waiting for the sequencer.
    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Valid half of the handshake. Succeeds only when the latch is empty.
    pub fn offer(&mut self, header: HeaderDescriptor) -> Result<(), Backpressure<HeaderDescriptor>> {
        if self.slot.is_some() {
            return Err(Backpressure(header));
        }
        self.slot = Some(header);
        Ok(())
    }

    /// The waiting descriptor, if any.
    pub fn peek(&self) -> Option<&HeaderDescriptor> {
        self.slot.as_ref()
    }

    /// Hand the waiting descriptor to the sequencer.
    pub fn take(&mut self) -> Option<HeaderDescriptor> {
        self.slot.take()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use ipframe_proto::{EthernetFields, IpFields, UdpFields};

    use super::*;

    fn header(dest: Ipv4Addr) -> HeaderDescriptor {
        HeaderDescriptor {
            eth: EthernetFields::default(),
            ip: IpFields::udp_v4(Ipv4Addr::LOCALHOST, dest),
            udp: UdpFields { length: 8, ..Default::default() },
        }
    }

    #[test]
    fn holds_one_header_at_a_time() {
        let mut latch = HeaderLatch::new();
        let first = header(Ipv4Addr::new(192, 168, 1, 101));
        let second = header(Ipv4Addr::new(192, 168, 1, 102));

        assert!(latch.offer(first).is_ok());
        assert!(latch.is_occupied());

        let rejected = latch.offer(second).unwrap_err();
        assert_eq!(rejected.into_inner(), second);
        assert_eq!(latch.peek(), Some(&first));
    }

    #[test]
    fn take_frees_the_slot() {
        let mut latch = HeaderLatch::new();
        let h = header(Ipv4Addr::new(192, 168, 1, 101));
        latch.offer(h).unwrap();

        assert_eq!(latch.take(), Some(h));
        assert!(latch.is_ready());
        assert_eq!(latch.take(), None);
    }
}
