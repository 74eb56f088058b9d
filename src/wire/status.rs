//! Pending-status bits a device raises towards its completion handler.

/// A received frame is waiting in the inbound queue
pub const RX_PENDING: u8 = 1 << 0;
/// A transmit finished and its statistics are waiting to be accounted
pub const TX_DONE: u8 = 1 << 1;

/// Renders a status bitmask for logs, e.g. `RT`, `R-`, `--`.
pub fn status_to_string(bits: u8) -> String {
    format!(
        "{}{}",
        if bits & RX_PENDING != 0 { "R" } else { "-" },
        if bits & TX_DONE != 0 { "T" } else { "-" },
    )
}
