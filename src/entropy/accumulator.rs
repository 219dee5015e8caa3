//! Rotate-and-XOR entropy accumulator.
//!
//! Each output byte is the low byte of a 32-bit accumulator after
//! `rounds_per_byte` rounds of:
//!
//! ```text
//! acc = rotl(acc, 1) ^ (sample & 0xFF)
//! wait 1 ms
//! ```
//!
//! Only the low 8 bits of each sample are mixed in. Rotating before mixing
//! spreads those bits across the whole accumulator over many rounds. The
//! pause between reads is needed because back-to-back reads of the same
//! analog pin are correlated.
//!
//! Generating one byte therefore takes roughly `rounds_per_byte`
//! milliseconds. Callers may depend on that timing.

use crate::diagnostics::Diagnostics;
use crate::hal::{AnalogInput, IndicatorOutput, Level, Ports};
use embedded_hal::delay::DelayNs;

/// Bytes drawn and discarded when priming.
pub const PRIME_BYTES: usize = 4;

/// The indicator toggles once every this many rounds.
pub const HEARTBEAT_INTERVAL: u32 = 64;

/// Minimum pause between consecutive samples, in milliseconds.
pub const SAMPLE_DELAY_MS: u32 = 1;

/// Folds analog samples into whitened bytes.
#[derive(Debug, Clone)]
pub struct EntropyAccumulator {
    state: u32,
    initialized: bool,
    rounds_per_byte: u32,
    diag: Diagnostics,
}

impl EntropyAccumulator {
    /// Creates a cleared accumulator. A round count of zero is treated as one.
    pub fn new(rounds_per_byte: u32, diag: Diagnostics) -> Self {
        Self {
            state: 0,
            initialized: false,
            rounds_per_byte: rounds_per_byte.max(1),
            diag,
        }
    }

    /// Seeds the accumulator by mixing in and discarding a few bytes.
    ///
    /// Calling this again re-primes on top of the current state.
    pub fn prime<A, I, D>(&mut self, ports: &mut Ports<A, I, D>)
    where
        A: AnalogInput,
        I: IndicatorOutput,
        D: DelayNs,
    {
        self.diag
            .info("initializing random data from the sample pin");
        for _ in 0..PRIME_BYTES {
            self.next_byte(ports);
        }
        self.initialized = true;
    }

    /// Produces one byte from `rounds_per_byte` timed samples.
    ///
    /// Leaves the indicator high when done.
    pub fn next_byte<A, I, D>(&mut self, ports: &mut Ports<A, I, D>) -> u8
    where
        A: AnalogInput,
        I: IndicatorOutput,
        D: DelayNs,
    {
        let mut blink = Level::Low;
        for round in 0..self.rounds_per_byte {
            let sample = ports.sample();
            self.state = self.state.rotate_left(1) ^ u32::from(sample as u8);
            ports.pause_ms(SAMPLE_DELAY_MS);

            if round % HEARTBEAT_INTERVAL == 0 {
                blink = blink.toggle();
                ports.set_indicator(blink);
            }
        }

        let byte = (self.state % 256) as u8;
        self.diag.trace(format_args!(
            "byte {byte:#04x} from mix {:#010x}",
            self.state
        ));
        ports.set_indicator(Level::High);
        byte
    }

    /// Fills `out` with consecutive bytes.
    pub fn fill_bytes<A, I, D>(&mut self, ports: &mut Ports<A, I, D>, out: &mut [u8])
    where
        A: AnalogInput,
        I: IndicatorOutput,
        D: DelayNs,
    {
        for slot in out.iter_mut() {
            *slot = self.next_byte(ports);
        }
    }

    /// Resets to the unprimed zero state.
    pub fn clear(&mut self) {
        self.state = 0;
        self.initialized = false;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn rounds_per_byte(&self) -> u32 {
        self.rounds_per_byte
    }

    /// Current accumulator value.
    #[inline]
    pub fn state(&self) -> u32 {
        self.state
    }
}
