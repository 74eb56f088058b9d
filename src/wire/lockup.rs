/// Periodically loses a transmit completion to simulate a wedged transmitter.
///
/// Only the fault is injected here. Getting the device going again is left
/// to whoever watches for stalls.
#[derive(Debug, Clone)]
pub struct LockupInjector {
    period: u32,
    accepted: u64,
}

impl LockupInjector {
    /// `period == 0` never fires.
    pub fn new(period: u32) -> Self {
        LockupInjector {
            period,
            accepted: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.period != 0
    }

    /// Records a transmit that reached the peer. Returns true when its
    /// completion has to be suppressed.
    pub fn on_accepted(&mut self) -> bool {
        self.accepted += 1;
        self.is_enabled() && self.accepted % u64::from(self.period) == 0
    }

    /// Transmits seen so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }
}
