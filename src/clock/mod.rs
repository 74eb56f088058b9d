mod system;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use self::mock::MockClock;

pub use self::system::SystemClock;

use std::time::Instant;

/// Source of transmit timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
