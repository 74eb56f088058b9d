//! The virtual wire: buffer pools, inbound queues, completions and the pair
//! that ties them together.
mod device;
pub mod header;
mod lockup;
mod packet;
mod pair;
mod pool;
mod queue;
pub mod status;

pub use self::device::{DeviceId, Occupancy, Stats, TxState};
pub use self::lockup::LockupInjector;
pub use self::packet::{Packet, PacketId};
pub use self::pair::{DevicePair, TxStatus};
pub use self::pool::BufferPool;
pub use self::queue::PacketQueue;
pub use self::status::{RX_PENDING, TX_DONE};
