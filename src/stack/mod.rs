//! The host networking stack as seen from the virtual wire.
//!
//! Registration, queue admission control and upward delivery all live on the
//! other side of this trait. The pair calls into it but never the reverse.
mod log;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use self::mock::MockStack;

pub use self::log::LogStack;

use std::fmt;
use thiserror::Error;

/// Opaque token handed out by [`HostStack::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackHandle(pub u32);

impl fmt::Display for StackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if#{}", self.0)
    }
}

/// What the stack learns about a device when it registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub hw_addr: [u8; 6],
    pub mtu: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("registration rejected: {0}")]
    Rejected(String),
    /// The stack could not allocate a buffer for an inbound frame.
    #[error("no buffer space for inbound frame")]
    NoBuffer,
}

/// Collaborator interface consumed by [`DevicePair`](crate::DevicePair).
///
/// Implementations must not block and must not call back into the pair:
/// `stop_queue`, `wake_queue` and `queue_is_stopped` may be invoked while a
/// device lock is held.
pub trait HostStack: Send + Sync {
    fn register(&self, info: &DeviceInfo) -> Result<StackHandle, StackError>;

    fn unregister(&self, handle: StackHandle);

    /// Allow the stack to hand frames to the device.
    fn start_queue(&self, handle: StackHandle);

    /// Stop handing frames to the device.
    fn stop_queue(&self, handle: StackHandle);

    /// Restart a stopped queue.
    fn wake_queue(&self, handle: StackHandle);

    /// Push a received frame up the stack.
    fn deliver(&self, handle: StackHandle, frame: &[u8]) -> Result<(), StackError>;

    fn queue_is_stopped(&self, handle: StackHandle) -> bool;
}
