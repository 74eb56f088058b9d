pub mod clock;
pub mod config;
pub mod error;
pub mod stack;
pub mod wire;


pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use stack::{DeviceInfo, HostStack, LogStack, StackError, StackHandle};
pub use wire::{DeviceId, DevicePair, Occupancy, Stats, TxState, TxStatus};
