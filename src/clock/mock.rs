use super::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Clock that only moves when a test tells it to.
#[derive(Clone)]
pub struct MockClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        MockClock {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}
