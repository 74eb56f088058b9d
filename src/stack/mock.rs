use super::{DeviceInfo, HostStack, StackError, StackHandle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    next_handle: u32,
    registered: Vec<(StackHandle, String)>,
    stopped: HashMap<StackHandle, bool>,
    delivered: Vec<(StackHandle, Vec<u8>)>,
    stop_calls: Vec<StackHandle>,
    wake_calls: Vec<StackHandle>,
    reject: Option<String>,
    drop_probability: f32,
}

/// Host stack double that records every call made by the pair.
#[derive(Clone, Default)]
pub struct MockStack {
    state: Arc<Mutex<State>>,
}

impl MockStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to register a device with this name.
    pub fn reject_registration(&self, name: &str) {
        self.state.lock().unwrap().reject = Some(name.to_string());
    }

    /// Set delivery failure probability (0.0 = accept all, 1.0 = refuse all)
    pub fn set_drop_probability(&self, probability: f32) {
        let prob = probability.clamp(0.0, 1.0);
        self.state.lock().unwrap().drop_probability = prob;
        println!("📉 Delivery failure probability set to {:.1}%", prob * 100.0);
    }

    pub fn registered(&self) -> Vec<(StackHandle, String)> {
        self.state.lock().unwrap().registered.clone()
    }

    pub fn delivered(&self) -> Vec<(StackHandle, Vec<u8>)> {
        self.state.lock().unwrap().delivered.clone()
    }

    pub fn delivered_to(&self, handle: StackHandle) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .delivered
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    pub fn stop_calls(&self, handle: StackHandle) -> usize {
        let state = self.state.lock().unwrap();
        state.stop_calls.iter().filter(|h| **h == handle).count()
    }

    pub fn wake_calls(&self, handle: StackHandle) -> usize {
        let state = self.state.lock().unwrap();
        state.wake_calls.iter().filter(|h| **h == handle).count()
    }
}

impl HostStack for MockStack {
    fn register(&self, info: &DeviceInfo) -> Result<StackHandle, StackError> {
        let mut state = self.state.lock().unwrap();
        if state.reject.as_deref() == Some(info.name.as_str()) {
            return Err(StackError::Rejected(format!("{} is blacklisted", info.name)));
        }
        let handle = StackHandle(state.next_handle);
        state.next_handle += 1;
        state.registered.push((handle, info.name.clone()));
        state.stopped.insert(handle, true);
        Ok(handle)
    }

    fn unregister(&self, handle: StackHandle) {
        let mut state = self.state.lock().unwrap();
        state.registered.retain(|(h, _)| *h != handle);
        state.stopped.remove(&handle);
    }

    fn start_queue(&self, handle: StackHandle) {
        self.state.lock().unwrap().stopped.insert(handle, false);
    }

    fn stop_queue(&self, handle: StackHandle) {
        let mut state = self.state.lock().unwrap();
        state.stop_calls.push(handle);
        state.stopped.insert(handle, true);
    }

    fn wake_queue(&self, handle: StackHandle) {
        let mut state = self.state.lock().unwrap();
        state.wake_calls.push(handle);
        state.stopped.insert(handle, false);
    }

    fn deliver(&self, handle: StackHandle, frame: &[u8]) -> Result<(), StackError> {
        let mut state = self.state.lock().unwrap();
        let drop_probability = state.drop_probability;
        if drop_probability > 0.0 && rand::random::<f32>() < drop_probability {
            println!("🔥 REFUSING inbound frame on {} (simulation)", handle);
            return Err(StackError::NoBuffer);
        }
        state.delivered.push((handle, frame.to_vec()));
        Ok(())
    }

    fn queue_is_stopped(&self, handle: StackHandle) -> bool {
        let state = self.state.lock().unwrap();
        state.stopped.get(&handle).copied().unwrap_or(true)
    }
}
