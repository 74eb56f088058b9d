use crate::wire::DeviceId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a frame or an operation on the pair was refused.
///
/// Every variant here is recoverable: the frame is dropped and counted, the
/// pair keeps running. Broken pool/queue invariants are not reported through
/// this type; they panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{device}: frame too short ({len} octets, need at least {min})")]
    FrameTooShort {
        device: DeviceId,
        len: usize,
        min: usize,
    },

    #[error("{device}: frame too long ({len} octets, capacity {max})")]
    FrameTooLong {
        device: DeviceId,
        len: usize,
        max: usize,
    },

    #[error("{device}: device is not open")]
    DeviceDown { device: DeviceId },

    /// The peer of `device` had no free buffer; `device`'s queue was stopped.
    #[error("{device}: peer buffer pool exhausted")]
    PoolExhausted { device: DeviceId },

    #[error("{device}: registration failed: {reason}")]
    Registration { device: DeviceId, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for the errors that stand for a dropped frame.
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            Error::FrameTooShort { .. }
                | Error::FrameTooLong { .. }
                | Error::DeviceDown { .. }
                | Error::PoolExhausted { .. }
        )
    }
}
