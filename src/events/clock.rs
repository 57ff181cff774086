//! Clock primitives for event timestamps.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Process-wide anchor for the monotonic clock.
static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed on the monotonic clock since the first call in this
/// process, with sub-millisecond precision.
pub fn monotonic_ms() -> f64 {
    let anchor = ANCHOR.get_or_init(Instant::now);
    anchor.elapsed().as_secs_f64() * 1000.0
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
