//! Construction parameters for a [`DevicePair`](crate::DevicePair).
use crate::error::{Error, Result};
use crate::wire::header::{ETH_HLEN, MIN_FRAME_LEN};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_POOL_SIZE: usize = 8;
pub const DEFAULT_MTU: usize = 1500;
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Buffers pre-allocated per device.
    pub pool_size: usize,
    /// Largest network-layer payload; a buffer holds `ETH_HLEN + mtu` octets.
    pub mtu: usize,
    /// Suppress every n-th transmit completion. 0 disables injection.
    pub lockup_period: u32,
    /// Initial state of the receive-interrupt flag on both devices.
    pub rx_interrupts: bool,
    /// How long a completion may stay pending before the device counts as stalled.
    pub tx_timeout: Duration,
    /// Zero-pad frames below the 60-octet Ethernet minimum before they hit the wire.
    pub pad_short_frames: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pool_size: DEFAULT_POOL_SIZE,
            mtu: DEFAULT_MTU,
            lockup_period: 0,
            rx_interrupts: true,
            tx_timeout: DEFAULT_TX_TIMEOUT,
            pad_short_frames: false,
        }
    }
}

impl Config {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn with_lockup_period(mut self, period: u32) -> Self {
        self.lockup_period = period;
        self
    }

    pub fn with_rx_interrupts(mut self, enabled: bool) -> Self {
        self.rx_interrupts = enabled;
        self
    }

    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = timeout;
        self
    }

    pub fn with_padding(mut self, pad: bool) -> Self {
        self.pad_short_frames = pad;
        self
    }

    /// Capacity of a single packet buffer.
    pub fn frame_capacity(&self) -> usize {
        ETH_HLEN + self.mtu
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::InvalidConfig("pool_size must be at least 1".into()));
        }
        if self.frame_capacity() < MIN_FRAME_LEN {
            return Err(Error::InvalidConfig(format!(
                "mtu {} cannot carry a network header",
                self.mtu
            )));
        }
        Ok(())
    }

    /// Defaults overridden by `LOOPWIRE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        if let Some(v) = read_var("LOOPWIRE_POOL_SIZE")? {
            config.pool_size = v;
        }
        if let Some(v) = read_var("LOOPWIRE_MTU")? {
            config.mtu = v;
        }
        if let Some(v) = read_var("LOOPWIRE_LOCKUP")? {
            config.lockup_period = v;
        }
        if let Some(v) = read_var("LOOPWIRE_RX_INTERRUPTS")? {
            config.rx_interrupts = v;
        }
        if let Some(ms) = read_var::<u64>("LOOPWIRE_TX_TIMEOUT_MS")? {
            config.tx_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = read_var("LOOPWIRE_PAD_SHORT_FRAMES")? {
            config.pad_short_frames = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn read_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{name}={raw:?} is not valid"))),
        Err(_) => Ok(None),
    }
}
