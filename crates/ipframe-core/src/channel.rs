//! Bounded ready/valid channel.
//!
//! A channel is "ready" while it has a free slot and "valid" while it holds at
//! least one item. A transfer happens only when a producer finds it ready, so
//! a full channel stalls its producer without losing anything.
//!
//! [`Channel::reserve`] hands out a [`Permit`] for a slot before the item
//! exists. The sequencer uses it to commit to an output slot first and only
//! then consume an input beat, which keeps forwarding all-or-nothing.

use std::collections::VecDeque;

use crate::error::Backpressure;

/// Bounded FIFO with non-blocking access on both ends.
#[derive(Debug, Clone)]
pub struct Channel<T> {
    queue: VecDeque<T>,
    capacity: usize,
}

impl<T> Channel<T> {
    /// Create a channel holding at most `capacity` items.
    ///
    /// A zero capacity is rejected by [`crate::EncapsulatorConfig::validate`]
    /// before any channel is built.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { queue: VecDeque::with_capacity(capacity), capacity }
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items currently queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// No items queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// A producer may transfer an item this tick.
    pub fn is_ready(&self) -> bool {
        self.queue.len() < self.capacity
    }

    /// A consumer may transfer an item this tick.
    pub fn is_valid(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Enqueue `item` if there is room.
    pub fn try_send(&mut self, item: T) -> Result<(), Backpressure<T>> {
        if !self.is_ready() {
            return Err(Backpressure(item));
        }
        self.queue.push_back(item);
        Ok(())
    }

    /// Reserve a slot for an item that will be produced later.
    pub fn reserve(&mut self) -> Option<Permit<'_, T>> {
        if self.is_ready() { Some(Permit { channel: self }) } else { None }
    }

    /// Dequeue the oldest item.
    pub fn try_recv(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    /// Oldest item, without dequeuing it.
    pub fn peek(&self) -> Option<&T> {
        self.queue.front()
    }
}

/// A reserved slot in a [`Channel`].
///
/// Dropping the permit releases the slot unused.
#[derive(Debug)]
pub struct Permit<'a, T> {
    channel: &'a mut Channel<T>,
}

impl<T> Permit<'_, T> {
    /// Fill the reserved slot.
    pub fn send(self, item: T) {
        self.channel.queue.push_back(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_channel_hands_item_back() {
        let mut ch = Channel::with_capacity(1);
        assert_eq!(ch.capacity(), 1);
        assert!(ch.try_send(1).is_ok());
        assert!(!ch.is_ready());

        let rejected = ch.try_send(2).unwrap_err();
        assert_eq!(rejected.into_inner(), 2);
        assert_eq!(ch.len(), 1);
    }

    #[test]
    fn fifo_order() {
        let mut ch = Channel::with_capacity(3);
        for i in 0..3 {
            ch.try_send(i).unwrap();
        }

        assert_eq!(ch.peek(), Some(&0));
        assert_eq!(ch.try_recv(), Some(0));
        assert_eq!(ch.try_recv(), Some(1));
        assert_eq!(ch.try_recv(), Some(2));
        assert_eq!(ch.try_recv(), None);
        assert!(!ch.is_valid());
    }

    #[test]
    fn permit_fills_reserved_slot() {
        let mut ch = Channel::with_capacity(1);

        let permit = ch.reserve().unwrap();
        permit.send('a');

        assert!(ch.reserve().is_none());
        assert_eq!(ch.try_recv(), Some('a'));
    }

    #[test]
    fn dropped_permit_releases_slot() {
        let mut ch: Channel<u8> = Channel::with_capacity(1);

        {
            let _permit = ch.reserve();
        }

        assert!(ch.is_empty());
        assert!(ch.is_ready());
    }
}
