//! Medium-access contention policies.
//!
//! A [`ContentionPolicy`] makes one transmission attempt per call: it decides
//! whether and when to put the offset request on the channel, sends it, and
//! interprets the arbiter's reply. Retrying failed attempts is the caller's
//! job. Policies never share state across stations; each station owns its
//! policy, [`RandomSource`] and [`BackoffCounter`].
//!
//! | Protocol | Before sending | On `HUH!` |
//! |---|---|---|
//! | Slotted ALOHA | coin flip with p = 1/N, then wait for the slot edge | report rejection |
//! | BEB | wait `U[0, 2^k - 1]` slots | `k += 1` (clamped) |
//! | Sensing BEB | probe `BUSY?` until `IDLE` | one BEB attempt |

mod aloha;
mod backoff;
mod beb;
mod policy;
mod random;
mod sensing;
pub mod slot;

pub use aloha::SlottedAloha;
pub use backoff::BackoffCounter;
pub use beb::BinaryExponentialBackoff;
pub use policy::{policy_for, AttemptContext, AttemptOutcome, ContentionPolicy};
pub use random::RandomSource;
pub use sensing::SensingBackoff;

#[cfg(test)]
mod testing;
