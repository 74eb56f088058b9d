use super::{DeviceInfo, HostStack, StackError, StackHandle};
use etherparse::{Ethernet2HeaderSlice, Ipv4HeaderSlice};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Entry {
    name: String,
    stopped: bool,
}

/// Host stack that accepts every frame and logs it.
///
/// Enough of a stack to drive a pair from the binary.
#[derive(Debug, Default)]
pub struct LogStack {
    next: AtomicU32,
    entries: Mutex<Vec<(StackHandle, Entry)>>,
}

impl LogStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entry<R>(&self, handle: StackHandle, f: impl FnOnce(&mut Entry) -> R) -> Option<R> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, entry)| f(entry))
    }
}

impl HostStack for LogStack {
    fn register(&self, info: &DeviceInfo) -> Result<StackHandle, StackError> {
        let handle = StackHandle(self.next.fetch_add(1, Ordering::Relaxed));
        info!(%handle, name = %info.name, mtu = info.mtu, "registered device");
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((
                handle,
                Entry {
                    name: info.name.clone(),
                    stopped: true,
                },
            ));
        Ok(handle)
    }

    fn unregister(&self, handle: StackHandle) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|(h, _)| *h != handle);
        info!(%handle, "unregistered device");
    }

    fn start_queue(&self, handle: StackHandle) {
        self.with_entry(handle, |e| e.stopped = false);
    }

    fn stop_queue(&self, handle: StackHandle) {
        if let Some(name) = self.with_entry(handle, |e| {
            e.stopped = true;
            e.name.clone()
        }) {
            debug!(%handle, %name, "queue stopped");
        }
    }

    fn wake_queue(&self, handle: StackHandle) {
        if let Some(name) = self.with_entry(handle, |e| {
            e.stopped = false;
            e.name.clone()
        }) {
            debug!(%handle, %name, "queue woken");
        }
    }

    fn deliver(&self, handle: StackHandle, frame: &[u8]) -> Result<(), StackError> {
        let eth_len = Ethernet2HeaderSlice::from_slice(frame)
            .map(|eth| eth.slice().len())
            .unwrap_or(0);
        match Ipv4HeaderSlice::from_slice(&frame[eth_len..]) {
            Ok(ip) => debug!(
                %handle,
                src = %ip.source_addr(),
                dst = %ip.destination_addr(),
                len = frame.len(),
                "frame delivered"
            ),
            Err(_) => debug!(%handle, len = frame.len(), "non-IPv4 frame delivered"),
        }
        Ok(())
    }

    fn queue_is_stopped(&self, handle: StackHandle) -> bool {
        self.with_entry(handle, |e| e.stopped).unwrap_or(true)
    }
}
