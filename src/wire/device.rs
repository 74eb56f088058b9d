use super::lockup::LockupInjector;
use super::pool::BufferPool;
use super::queue::PacketQueue;
use crate::config::Config;
use crate::stack::StackHandle;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// One end of the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    Sn0,
    Sn1,
}

impl DeviceId {
    pub const ALL: [DeviceId; 2] = [DeviceId::Sn0, DeviceId::Sn1];

    pub fn index(self) -> usize {
        match self {
            DeviceId::Sn0 => 0,
            DeviceId::Sn1 => 1,
        }
    }

    /// The other end.
    pub fn peer(self) -> DeviceId {
        match self {
            DeviceId::Sn0 => DeviceId::Sn1,
            DeviceId::Sn1 => DeviceId::Sn0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeviceId::Sn0 => "sn0",
            DeviceId::Sn1 => "sn1",
        }
    }

    /// Address assigned on open: `\0SNUL0` and `\0SNUL1`.
    pub fn hw_addr(self) -> [u8; 6] {
        let mut addr = *b"\0SNUL0";
        addr[5] += self.index() as u8;
        addr
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Running counters for one device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub tx_dropped: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub rx_dropped: u64,
}

/// Where a device's most recent transmit stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    Transmitting,
    /// The completion was lost. Later completions still account the
    /// transmit, but only reopening the device leaves this state.
    CompletionPending,
    CompletionDelivered,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxState::Idle => write!(f, "IDLE"),
            TxState::Transmitting => write!(f, "TRANSMITTING"),
            TxState::CompletionPending => write!(f, "COMPLETION-PENDING"),
            TxState::CompletionDelivered => write!(f, "COMPLETION-DELIVERED"),
        }
    }
}

/// Where a device's buffers are right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub free: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub capacity: usize,
}

impl Occupancy {
    /// Every buffer is accounted for exactly once.
    pub fn is_conserved(&self) -> bool {
        self.free + self.queued + self.in_flight == self.capacity
    }
}

/// Transmits recorded but not yet accounted by a `TX_DONE` completion.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PendingTx {
    pub(crate) packets: u64,
    pub(crate) bytes: u64,
}

/// Everything guarded by a device's lock.
#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) open: bool,
    pub(crate) hw_addr: [u8; 6],
    pub(crate) pool: BufferPool,
    pub(crate) queue: PacketQueue,
    /// Buffers taken off the queue and currently being delivered.
    pub(crate) in_flight: usize,
    pub(crate) rx_int_enabled: bool,
    pub(crate) status: u8,
    pub(crate) tx_pending: PendingTx,
    pub(crate) trans_start: Option<Instant>,
    /// When the outstanding lost completion was injected.
    pub(crate) locked_up_at: Option<Instant>,
    pub(crate) state: TxState,
    pub(crate) lockup: LockupInjector,
    /// The peer was stopped because this pool ran dry.
    pub(crate) starved_peer: bool,
    pub(crate) stats: Stats,
}

impl Inner {
    pub(crate) fn occupancy(&self) -> Occupancy {
        Occupancy {
            free: self.pool.available(),
            queued: self.queue.len(),
            in_flight: self.in_flight,
            capacity: self.pool.capacity(),
        }
    }
}

pub(crate) struct Device {
    pub(crate) id: DeviceId,
    pub(crate) handle: StackHandle,
    inner: Mutex<Inner>,
}

impl Device {
    pub(crate) fn new(
        id: DeviceId,
        handle: StackHandle,
        hw_addr: [u8; 6],
        config: &Config,
    ) -> Self {
        Device {
            id,
            handle,
            inner: Mutex::new(Inner {
                open: false,
                hw_addr,
                pool: BufferPool::new(id, config.pool_size, config.frame_capacity()),
                queue: PacketQueue::new(id, config.pool_size),
                in_flight: 0,
                rx_int_enabled: config.rx_interrupts,
                status: 0,
                tx_pending: PendingTx::default(),
                trans_start: None,
                locked_up_at: None,
                state: TxState::Idle,
                lockup: LockupInjector::new(config.lockup_period),
                starved_peer: false,
                stats: Stats::default(),
            }),
        }
    }

    /// Invariant checks run before any mutation, so a poisoned lock still
    /// guards consistent state.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
