//! The toy "crossed a hop" rewrite applied to every frame on the wire.
use etherparse::{Ethernet2Header, Ipv4Header, Ipv4HeaderSlice};

/// Link-layer header length.
pub const ETH_HLEN: usize = Ethernet2Header::LEN;
/// Smallest IPv4 header.
pub const IPV4_MIN_HLEN: usize = Ipv4Header::MIN_LEN;
/// Anything shorter cannot carry a link header plus a network header.
pub const MIN_FRAME_LEN: usize = ETH_HLEN + IPV4_MIN_HLEN;
/// Minimum Ethernet frame length without FCS.
pub const ETH_ZLEN: usize = 60;

const CHECK_OFFSET: usize = 10;
const SADDR_OFFSET: usize = 12;
const DADDR_OFFSET: usize = 16;

/// Flips the third octet of the IPv4 source and destination addresses and
/// rebuilds the header checksum, so the frame looks like it came from the
/// other network.
///
/// Returns the new checksum, or `None` when the bytes after the link header
/// are not a parseable IPv4 header; the addresses are flipped either way.
///
/// # Panics
///
/// If `frame` is shorter than [`MIN_FRAME_LEN`].
pub fn rewrite_for_peer(frame: &mut [u8]) -> Option<u16> {
    let end = MIN_FRAME_LEN.max(ETH_HLEN + ip_header_len(frame));
    let ip = &mut frame[ETH_HLEN..end];
    ip[SADDR_OFFSET + 2] ^= 1;
    ip[DADDR_OFFSET + 2] ^= 1;

    let check = Ipv4HeaderSlice::from_slice(ip)
        .ok()?
        .to_header()
        .calc_header_checksum();
    ip[CHECK_OFFSET..CHECK_OFFSET + 2].copy_from_slice(&check.to_be_bytes());
    Some(check)
}

/// Header length announced by the IHL nibble, clamped to what the frame holds.
fn ip_header_len(frame: &[u8]) -> usize {
    let ihl = usize::from(frame[ETH_HLEN] & 0x0f) * 4;
    ihl.min(frame.len() - ETH_HLEN)
}
