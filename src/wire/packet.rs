use super::DeviceId;
use std::fmt;

/// Index of a buffer inside its owner's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketId(pub(crate) usize);

impl PacketId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A fixed-capacity frame buffer.
///
/// Packets are created once, when a pool is filled, and move by value between
/// the pool, the inbound queue and the completion handler. There is no way to
/// clone one, so a buffer can only ever sit in a single place.
pub struct Packet {
    id: PacketId,
    owner: DeviceId,
    len: usize,
    data: Box<[u8]>,
}

impl Packet {
    pub(crate) fn new(id: PacketId, owner: DeviceId, capacity: usize) -> Self {
        Packet {
            id,
            owner,
            len: 0,
            data: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn id(&self) -> PacketId {
        self.id
    }

    /// Device whose pool this buffer belongs to.
    pub fn owner(&self) -> DeviceId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The frame currently held.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub(crate) fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    /// Copies `frame` in, zero-padding up to `min_len`. Returns the stored length.
    ///
    /// The caller checks `frame` against the capacity first.
    pub(crate) fn fill(&mut self, frame: &[u8], min_len: usize) -> usize {
        let len = frame.len().max(min_len).min(self.data.len());
        self.data[..frame.len()].copy_from_slice(frame);
        self.data[frame.len()..len].fill(0);
        self.len = len;
        len
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("len", &self.len)
            .finish()
    }
}
