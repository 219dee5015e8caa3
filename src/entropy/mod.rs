//! Entropy collection from a noisy analog pin.
//!
//! Integer-only mixing; no hashing and no floating point.

mod accumulator;

pub use accumulator::{EntropyAccumulator, HEARTBEAT_INTERVAL, PRIME_BYTES, SAMPLE_DELAY_MS};
