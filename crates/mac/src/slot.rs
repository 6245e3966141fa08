//! Slot timing.
//!
//! Stations never rendezvous with each other. Slot edges are the multiples
//! of the slot duration on the wall clock, so every station computes the
//! same edges independently.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time since the Unix epoch.
pub fn wall_clock() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Wait until the next slot edge: `slot - (now_ms mod slot)` milliseconds.
///
/// Exactly on an edge this is a full slot.
pub fn until_next_slot(slot: Duration, now: Duration) -> Duration {
    let slot_ms = slot.as_millis().max(1);
    let now_ms = now.as_millis();
    let wait_ms = slot_ms - now_ms % slot_ms;
    Duration::from_millis(wait_ms as u64)
}

/// Sleep until the next slot edge on the wall clock.
pub async fn sleep_until_next_slot(slot: Duration) {
    tokio::time::sleep(until_next_slot(slot, wall_clock())).await;
}

/// `slots` whole slots.
pub fn slots(slot: Duration, slots: u64) -> Duration {
    slot.saturating_mul(u32::try_from(slots).unwrap_or(u32::MAX))
}
