//! Two devices wired back to back.
//!
//! A transmit on one device lands in the other's inbound queue. Completions
//! that real hardware would signal with an interrupt are run in-line, on the
//! transmitting thread, through [`DevicePair::interrupt`]'s handler.
//!
//! Locking: each device has one mutex over its pool, queue, status and
//! counters. No code path holds both devices' locks, and no lock is held
//! while a frame is handed to the host stack.
use super::device::{Device, DeviceId, Inner, Occupancy, Stats, TxState};
use super::header::{self, ETH_ZLEN, MIN_FRAME_LEN};
use super::packet::Packet;
use super::status::{status_to_string, RX_PENDING, TX_DONE};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::stack::{DeviceInfo, HostStack, StackHandle};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Outcome of an accepted transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Frame is with the peer and the transmit completion ran.
    Completed,
    /// Frame is with the peer but the completion was lost and the queue stopped.
    CompletionPending,
}

pub struct DevicePair {
    devices: [Device; 2],
    stack: Arc<dyn HostStack>,
    clock: Arc<dyn Clock>,
    config: Config,
    torn_down: bool,
}

impl DevicePair {
    /// Allocates both devices, fills their pools and registers them.
    pub fn new(config: Config, stack: Arc<dyn HostStack>) -> Result<Self> {
        Self::with_clock(config, stack, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: Config,
        stack: Arc<dyn HostStack>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let sn0 = Self::register(&*stack, DeviceId::Sn0, &config)?;
        let sn1 = match Self::register(&*stack, DeviceId::Sn1, &config) {
            Ok(dev) => dev,
            Err(err) => {
                stack.unregister(sn0.handle);
                return Err(err);
            }
        };

        info!(
            pool_size = config.pool_size,
            mtu = config.mtu,
            lockup_period = config.lockup_period,
            "device pair ready"
        );
        Ok(DevicePair {
            devices: [sn0, sn1],
            stack,
            clock,
            config,
            torn_down: false,
        })
    }

    fn register(stack: &dyn HostStack, id: DeviceId, config: &Config) -> Result<Device> {
        let hw_addr = random_hw_addr();
        let info = DeviceInfo {
            name: id.name().to_string(),
            hw_addr,
            mtu: config.mtu,
        };
        match stack.register(&info) {
            Ok(handle) => {
                debug!(device = %id, %handle, "registered");
                Ok(Device::new(id, handle, hw_addr, config))
            }
            Err(err) => {
                warn!(device = %id, %err, "error registering device");
                Err(Error::Registration {
                    device: id,
                    reason: err.to_string(),
                })
            }
        }
    }

    fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.index()]
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Brings a device up: fixed hardware address, queue started.
    ///
    /// Reopening is also the only way out of a lost completion.
    pub fn open(&self, id: DeviceId) {
        let dev = self.device(id);
        {
            let mut inner = dev.lock();
            inner.hw_addr = id.hw_addr();
            inner.open = true;
            if inner.state == TxState::CompletionPending {
                inner.state = TxState::Idle;
                inner.locked_up_at = None;
            }
        }
        self.stack.start_queue(dev.handle);
        info!(device = %id, "opened");
    }

    pub fn close(&self, id: DeviceId) {
        let dev = self.device(id);
        dev.lock().open = false;
        {
            // A pending wake from the peer's pool must not restart a closed queue.
            let mut peer = self.device(id.peer()).lock();
            peer.starved_peer = false;
            self.stack.stop_queue(dev.handle);
        }
        info!(device = %id, "closed");
    }

    /// Puts `frame` on the wire from `id` towards its peer.
    ///
    /// Rejected frames are counted in `tx_dropped` and reported as `Err`.
    pub fn transmit(&self, id: DeviceId, frame: &[u8]) -> Result<TxStatus> {
        let dev = self.device(id);
        let capacity = self.config.frame_capacity();

        {
            let mut inner = dev.lock();
            let rejected = if !inner.open {
                Some(Error::DeviceDown { device: id })
            } else if frame.len() < MIN_FRAME_LEN {
                Some(Error::FrameTooShort {
                    device: id,
                    len: frame.len(),
                    min: MIN_FRAME_LEN,
                })
            } else if frame.len() > capacity {
                Some(Error::FrameTooLong {
                    device: id,
                    len: frame.len(),
                    max: capacity,
                })
            } else {
                None
            };
            if let Some(err) = rejected {
                inner.stats.tx_dropped += 1;
                drop(inner);
                warn!(device = %id, %err, "frame dropped");
                return Err(err);
            }
        }

        let wire_len = self.push_to_peer(dev, frame)?;

        let suppress = {
            let mut inner = dev.lock();
            inner.tx_pending.packets += 1;
            inner.tx_pending.bytes += wire_len as u64;
            let now = self.clock.now();
            inner.trans_start = Some(now);
            inner.status |= TX_DONE;
            let suppress = inner.lockup.on_accepted();
            if suppress {
                inner.state = TxState::CompletionPending;
                inner.locked_up_at.get_or_insert(now);
            } else if inner.state != TxState::CompletionPending {
                inner.state = TxState::Transmitting;
            }
            suppress
        };

        if suppress {
            self.stack.stop_queue(dev.handle);
            warn!(device = %id, "simulating lost transmit interrupt, queue stopped");
            return Ok(TxStatus::CompletionPending);
        }

        self.handle_completion(id);
        Ok(TxStatus::Completed)
    }

    /// Copies `frame` into a buffer from the peer's pool and queues it there.
    /// Returns the length that went on the wire.
    fn push_to_peer(&self, dev: &Device, frame: &[u8]) -> Result<usize> {
        let id = dev.id;
        let peer = self.device(id.peer());
        let min_len = if self.config.pad_short_frames { ETH_ZLEN } else { 0 };

        let (wire_len, raise_rx) = {
            let mut inner = peer.lock();
            let Some(mut pkt) = inner.pool.acquire() else {
                // Stop and wake for this pool are both issued under its lock.
                inner.starved_peer = true;
                self.stack.stop_queue(dev.handle);
                drop(inner);
                dev.lock().stats.tx_dropped += 1;
                warn!(device = %id, peer = %peer.id, "peer pool exhausted, queue stopped");
                return Err(Error::PoolExhausted { device: id });
            };

            let wire_len = pkt.fill(frame, min_len);
            if header::rewrite_for_peer(pkt.payload_mut()).is_none() {
                trace!(device = %id, "no IPv4 header, checksum left alone");
            }
            trace!(
                device = %id,
                buffer = pkt.id().index(),
                len = wire_len,
                "frame queued on peer"
            );
            inner.queue.enqueue(pkt);

            let raise_rx = inner.rx_int_enabled;
            if raise_rx {
                inner.status |= RX_PENDING;
            }
            (wire_len, raise_rx)
        };

        if raise_rx {
            self.handle_completion(peer.id);
        }
        Ok(wire_len)
    }

    /// Raises `bits` on a device and runs its completion handler, the way a
    /// device interrupt would.
    ///
    /// With receive interrupts masked this is how queued frames get pulled,
    /// one per raised `RX_PENDING`.
    pub fn interrupt(&self, id: DeviceId, bits: u8) {
        self.device(id).lock().status |= bits & (RX_PENDING | TX_DONE);
        self.handle_completion(id);
    }

    /// The completion handler: snapshot and clear the status, account a
    /// finished transmit, deliver queued frames.
    fn handle_completion(&self, id: DeviceId) {
        let dev = self.device(id);

        let (bits, mut next) = {
            let mut inner = dev.lock();
            let bits = std::mem::take(&mut inner.status);
            if bits & TX_DONE != 0 {
                let done = std::mem::take(&mut inner.tx_pending);
                inner.stats.tx_packets += done.packets;
                inner.stats.tx_bytes += done.bytes;
                if done.packets > 0 && inner.state != TxState::CompletionPending {
                    inner.state = TxState::CompletionDelivered;
                }
            }
            let next = if bits & RX_PENDING != 0 {
                take_queued(&mut inner)
            } else {
                None
            };
            (bits, next)
        };
        trace!(device = %id, status = %status_to_string(bits), "completion");

        if bits & RX_PENDING != 0 && next.is_none() {
            trace!(device = %id, "receive completion found an empty queue");
        }
        while let Some(pkt) = next.take() {
            next = self.receive(dev, pkt);
        }
    }

    /// Hands one frame to the stack and recycles its buffer. Returns the next
    /// queued frame when receive interrupts are enabled.
    fn receive(&self, dev: &Device, pkt: Packet) -> Option<Packet> {
        let delivered = self.stack.deliver(dev.handle, pkt.payload());
        let len = pkt.len() as u64;

        let mut inner = dev.lock();
        match &delivered {
            Ok(()) => {
                inner.stats.rx_packets += 1;
                inner.stats.rx_bytes += len;
            }
            Err(_) => inner.stats.rx_dropped += 1,
        }
        inner.in_flight -= 1;
        inner.pool.release(pkt);

        if inner.starved_peer && !inner.pool.is_empty() {
            inner.starved_peer = false;
            let starved = self.device(dev.id.peer()).handle;
            if self.stack.queue_is_stopped(starved) {
                self.stack.wake_queue(starved);
                debug!(device = %dev.id.peer(), "buffer released, queue woken");
            }
        }
        debug_assert!(inner.occupancy().is_conserved(), "{}: buffer leak", dev.id);

        let next = if inner.rx_int_enabled {
            take_queued(&mut inner)
        } else {
            None
        };
        drop(inner);

        if let Err(err) = delivered {
            warn!(device = %dev.id, %err, "inbound frame dropped by stack");
        }
        next
    }

    /// Masks or unmasks receive interrupts.
    pub fn set_rx_interrupts(&self, id: DeviceId, enable: bool) {
        self.device(id).lock().rx_int_enabled = enable;
        debug!(device = %id, enable, "receive interrupts");
    }

    pub fn stats(&self, id: DeviceId) -> Stats {
        self.device(id).lock().stats
    }

    pub fn occupancy(&self, id: DeviceId) -> Occupancy {
        self.device(id).lock().occupancy()
    }

    pub fn tx_state(&self, id: DeviceId) -> TxState {
        self.device(id).lock().state
    }

    /// Status bits raised but not yet handled.
    pub fn pending_status(&self, id: DeviceId) -> u8 {
        self.device(id).lock().status
    }

    pub fn hw_addr(&self, id: DeviceId) -> [u8; 6] {
        self.device(id).lock().hw_addr
    }

    pub fn is_open(&self, id: DeviceId) -> bool {
        self.device(id).lock().open
    }

    pub fn handle(&self, id: DeviceId) -> StackHandle {
        self.device(id).handle
    }

    /// True once a lost completion has been outstanding for `tx_timeout`.
    ///
    /// Traffic arriving on the device does not clear this; only [`open`]
    /// does. Detection only; nothing here resets the device.
    ///
    /// [`open`]: DevicePair::open
    pub fn is_stalled(&self, id: DeviceId) -> bool {
        let inner = self.device(id).lock();
        match (inner.state, inner.locked_up_at) {
            (TxState::CompletionPending, Some(since)) => {
                self.clock.now().saturating_duration_since(since) >= self.config.tx_timeout
            }
            _ => false,
        }
    }

    /// Returns every queued buffer to its pool, destroys both pools and
    /// unregisters both devices. Returns how many queued buffers were
    /// reclaimed.
    pub fn teardown(mut self) -> usize {
        self.shutdown()
    }

    fn shutdown(&mut self) -> usize {
        let mut reclaimed = 0;
        for dev in &self.devices {
            let mut inner = dev.lock();
            assert_eq!(inner.in_flight, 0, "{}: teardown during delivery", dev.id);
            while let Some(pkt) = inner.queue.dequeue() {
                inner.pool.release(pkt);
                reclaimed += 1;
            }
            let destroyed = inner.pool.destroy();
            inner.open = false;
            drop(inner);
            self.stack.unregister(dev.handle);
            debug!(device = %dev.id, destroyed, "pool destroyed");
        }
        self.torn_down = true;
        info!(reclaimed, "device pair torn down");
        reclaimed
    }
}

impl Drop for DevicePair {
    fn drop(&mut self) {
        if !self.torn_down && !std::thread::panicking() {
            self.shutdown();
        }
    }
}

/// Pops the oldest queued buffer and marks it in flight.
fn take_queued(inner: &mut Inner) -> Option<Packet> {
    let pkt = inner.queue.dequeue()?;
    inner.in_flight += 1;
    Some(pkt)
}

/// Random unicast, locally administered address.
fn random_hw_addr() -> [u8; 6] {
    let mut addr: [u8; 6] = rand::random();
    addr[0] = (addr[0] & 0xfe) | 0x02;
    addr
}
