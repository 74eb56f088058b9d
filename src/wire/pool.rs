//! Per-device free list of pre-allocated packet buffers.
use super::packet::{Packet, PacketId};
use super::DeviceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    Loaned,
}

/// Fixed set of buffers owned by one device.
///
/// `slots` is a ledger indexed by [`PacketId`]; it is what makes a second
/// release of the same buffer detectable.
#[derive(Debug)]
pub struct BufferPool {
    owner: DeviceId,
    free: Vec<Packet>,
    slots: Vec<Slot>,
}

impl BufferPool {
    /// Pre-fills `size` buffers of `capacity` octets each.
    pub fn new(owner: DeviceId, size: usize, capacity: usize) -> Self {
        let free = (0..size)
            .rev()
            .map(|i| Packet::new(PacketId(i), owner, capacity))
            .collect();
        BufferPool {
            owner,
            free,
            slots: vec![Slot::Free; size],
        }
    }

    /// Takes the head of the free list, or `None` when every buffer is out.
    pub fn acquire(&mut self) -> Option<Packet> {
        let pkt = self.free.pop()?;
        self.slots[pkt.id().index()] = Slot::Loaned;
        Some(pkt)
    }

    /// Puts a buffer back at the head of the free list.
    ///
    /// # Panics
    ///
    /// If the buffer belongs to another pool, is unknown, or is already free.
    pub fn release(&mut self, mut pkt: Packet) {
        assert_eq!(
            pkt.owner(),
            self.owner,
            "{}: buffer {:?} released into a foreign pool",
            self.owner,
            pkt.id()
        );
        let Some(slot) = self.slots.get_mut(pkt.id().index()) else {
            panic!("{}: unknown buffer {:?}", self.owner, pkt.id());
        };
        if *slot == Slot::Free {
            panic!("{}: buffer {:?} released twice", self.owner, pkt.id());
        }
        *slot = Slot::Free;
        pkt.clear();
        self.free.push(pkt);
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Buffers on the free list.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Buffers currently handed out.
    pub fn loaned(&self) -> usize {
        self.capacity() - self.available()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Frees every buffer. Returns how many were destroyed.
    ///
    /// # Panics
    ///
    /// If any buffer is still out of the pool.
    pub fn destroy(&mut self) -> usize {
        assert_eq!(
            self.loaned(),
            0,
            "{}: {} buffer(s) never came back to the pool",
            self.owner,
            self.loaned()
        );
        let destroyed = self.free.len();
        self.free.clear();
        self.slots.clear();
        destroyed
    }
}
