use etherparse::PacketBuilder;
use loopwire::{Config, DeviceId, DevicePair, Error, LogStack, TxStatus};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;

const FRAMES_PER_SENDER: u16 = 64;

#[derive(Default)]
struct Tally {
    completed: u32,
    pending: u32,
    dropped: u32,
}

/// UDP datagram from `src` to `dst` inside an Ethernet frame.
fn frame(
    src: DeviceId,
    dst: DeviceId,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    seq: u16,
) -> Vec<u8> {
    let payload = format!("loopwire frame #{seq} from {src}");
    let builder = PacketBuilder::ethernet2(src.hw_addr(), dst.hw_addr())
        .ipv4(src_ip.octets(), dst_ip.octets(), 64)
        .udp(9000 + src.index() as u16, 9000 + dst.index() as u16);
    let mut pkt = Vec::with_capacity(builder.size(payload.len()));
    builder
        .write(&mut pkt, payload.as_bytes())
        .expect("writing into a Vec cannot fail");
    pkt
}

fn send_all(pair: &DevicePair, from: DeviceId, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Tally {
    let mut tally = Tally::default();
    for seq in 0..FRAMES_PER_SENDER {
        match pair.transmit(from, &frame(from, from.peer(), src_ip, dst_ip, seq)) {
            Ok(TxStatus::Completed) => tally.completed += 1,
            Ok(TxStatus::CompletionPending) => tally.pending += 1,
            Err(Error::PoolExhausted { .. }) => {
                tally.dropped += 1;
                thread::yield_now();
            }
            Err(_) => tally.dropped += 1,
        }
    }
    tally
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(2);
        }
    };

    let pair = match DevicePair::new(config, Arc::new(LogStack::new())) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };
    for id in DeviceId::ALL {
        pair.open(id);
    }

    println!(
        "🔌 sn0 <-> sn1 wired, {} buffers per device",
        pair.config().pool_size
    );

    let (left, right) = thread::scope(|s| {
        let left = s.spawn(|| {
            send_all(
                &pair,
                DeviceId::Sn0,
                Ipv4Addr::new(192, 168, 0, 1),
                Ipv4Addr::new(192, 168, 0, 2),
            )
        });
        let right = s.spawn(|| {
            send_all(
                &pair,
                DeviceId::Sn1,
                Ipv4Addr::new(192, 168, 1, 2),
                Ipv4Addr::new(192, 168, 1, 1),
            )
        });
        (left.join(), right.join())
    });

    for (id, tally) in DeviceId::ALL.into_iter().zip([left, right]) {
        let tally = match tally {
            Ok(tally) => tally,
            Err(_) => {
                eprintln!("❌ sender on {id} panicked");
                std::process::exit(1);
            }
        };
        let stats = pair.stats(id);
        let occupancy = pair.occupancy(id);
        println!("\n📊 {} statistics:", id);
        println!(
            "   Sent: {} completed, {} completion pending, {} dropped",
            tally.completed, tally.pending, tally.dropped
        );
        println!(
            "   TX: {} packets, {} bytes, {} dropped",
            stats.tx_packets, stats.tx_bytes, stats.tx_dropped
        );
        println!(
            "   RX: {} packets, {} bytes, {} dropped",
            stats.rx_packets, stats.rx_bytes, stats.rx_dropped
        );
        println!(
            "   Buffers: {} free, {} queued, {} in flight",
            occupancy.free, occupancy.queued, occupancy.in_flight
        );
        println!("   State: {}", pair.tx_state(id));
    }

    let reclaimed = pair.teardown();
    println!("\n🔚 Pair torn down, {} queued buffer(s) reclaimed", reclaimed);
}
