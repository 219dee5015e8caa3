//! Simulated hardware for host builds and tests.
//!
//! `SimulatedAdc` models a floating 10-bit analog pin: a slowly wandering
//! baseline plus per-read noise. It is NOT an entropy source in itself,
//! only a stand-in that lets the identifier lifecycle run off-target.

use super::{AnalogInput, IndicatorOutput, Level, PinId};
use rand_chacha::ChaCha8Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

/// Full-scale value of the simulated 10-bit converter.
const ADC_MAX: u16 = 1023;

/// Floating-pin model driven by a ChaCha stream.
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    rng: ChaCha8Rng,
    baseline: u16,
    noise_span: u16,
    configured_pin: Option<PinId>,
    reads: u64,
}

impl SimulatedAdc {
    /// Creates a simulated pin seeded from the OS entropy source.
    pub fn from_os_entropy() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::with_rng(ChaCha8Rng::from_seed(seed))
    }

    /// Creates a reproducible simulated pin.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            baseline: 512,
            noise_span: 64,
            configured_pin: None,
            reads: 0,
        }
    }

    /// Number of samples taken so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn configured_pin(&self) -> Option<PinId> {
        self.configured_pin
    }
}

impl AnalogInput for SimulatedAdc {
    fn configure_input(&mut self, pin: PinId) {
        self.configured_pin = Some(pin);
    }

    fn read(&mut self, _pin: PinId) -> u16 {
        let word = self.rng.next_u32();

        // Baseline drifts by at most one step per read.
        match word >> 30 {
            0 => self.baseline = self.baseline.saturating_sub(1),
            1 => self.baseline = self.baseline.saturating_add(1).min(ADC_MAX),
            _ => {}
        }

        let noise = (word & 0xFFFF) as u16 % self.noise_span;
        let low = self.baseline.saturating_sub(self.noise_span / 2);
        self.reads += 1;
        low.saturating_add(noise).min(ADC_MAX)
    }
}

/// A stuck pin that always reports the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantAdc {
    value: u16,
    configured_pin: Option<PinId>,
}

impl ConstantAdc {
    pub fn new(value: u16) -> Self {
        Self {
            value,
            configured_pin: None,
        }
    }

    pub fn configured_pin(&self) -> Option<PinId> {
        self.configured_pin
    }
}

impl AnalogInput for ConstantAdc {
    fn configure_input(&mut self, pin: PinId) {
        self.configured_pin = Some(pin);
    }

    fn read(&mut self, _pin: PinId) -> u16 {
        self.value
    }
}

#[derive(Debug, Default)]
struct IndicatorLog {
    configured: Vec<PinId>,
    writes: Vec<(PinId, Level)>,
}

/// Indicator that records every level written to it.
///
/// Clones share one log.
#[derive(Debug, Default, Clone)]
pub struct RecordingIndicator {
    log: Rc<RefCell<IndicatorLog>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(pin, level)` writes in order.
    pub fn writes(&self) -> Vec<(PinId, Level)> {
        self.log.borrow().writes.clone()
    }

    /// Pins that were put into output mode.
    pub fn configured_pins(&self) -> Vec<PinId> {
        self.log.borrow().configured.clone()
    }

    /// Most recent level written, if any.
    pub fn last_level(&self) -> Option<Level> {
        self.log.borrow().writes.last().map(|&(_, level)| level)
    }

    pub fn clear(&self) {
        self.log.borrow_mut().writes.clear();
    }
}

impl IndicatorOutput for RecordingIndicator {
    fn configure_output(&mut self, pin: PinId) {
        self.log.borrow_mut().configured.push(pin);
    }

    fn set_level(&mut self, pin: PinId, level: Level) {
        self.log.borrow_mut().writes.push((pin, level));
    }
}
