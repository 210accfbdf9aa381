use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use rand::Rng;

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generates a multipart boundary from the clock and random bytes.
///
/// The sequence number keeps boundaries unique within the process even if the clock
/// stalls.
pub(crate) fn generate_multipart_boundary() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let time_lo = (timestamp & 0xFFFFFFFF) as u32;
    let time_hi = ((timestamp >> 32) & 0xFFFFFFFF) as u32;
    let entropy: u64 = rand::thread_rng().gen();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    format!("----formstream.boundary.{time_hi:08x}{time_lo:08x}.{entropy:016x}.{seq:x}")
}
