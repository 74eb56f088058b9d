//! Per-device inbound queue of frames waiting for the host stack.
use super::packet::Packet;
use super::DeviceId;
use std::collections::VecDeque;

/// FIFO of received buffers. Never longer than the owner's pool.
#[derive(Debug)]
pub struct PacketQueue {
    owner: DeviceId,
    entries: VecDeque<Packet>,
    limit: usize,
}

impl PacketQueue {
    pub fn new(owner: DeviceId, limit: usize) -> Self {
        PacketQueue {
            owner,
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// # Panics
    ///
    /// If the queue would hold more buffers than the pool ever had, or the
    /// buffer belongs to another device.
    pub fn enqueue(&mut self, pkt: Packet) {
        assert!(
            self.entries.len() < self.limit,
            "{}: queue corruption, {} buffers queued with a pool of {}",
            self.owner,
            self.entries.len() + 1,
            self.limit
        );
        assert_eq!(
            pkt.owner(),
            self.owner,
            "{}: queue corruption, foreign buffer {:?}",
            self.owner,
            pkt.id()
        );
        debug_assert!(
            self.entries.iter().all(|p| p.id() != pkt.id()),
            "{}: buffer {:?} queued twice",
            self.owner,
            pkt.id()
        );
        self.entries.push_back(pkt);
    }

    /// Removes the oldest entry.
    pub fn dequeue(&mut self) -> Option<Packet> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
