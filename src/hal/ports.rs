//! Port traits for the sample pin and the indicator pin.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Board-specific pin designator.
pub type PinId = u8;

/// Logical level of a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Returns the opposite level.
    #[inline]
    pub fn toggle(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// A source of noisy analog samples, typically a floating ADC pin.
pub trait AnalogInput {
    /// Puts the pin into input mode.
    fn configure_input(&mut self, _pin: PinId) {}

    /// Takes one sample. The range is platform-defined.
    fn read(&mut self, pin: PinId) -> u16;
}

/// A binary output used purely as a visual activity signal.
///
/// Implementations must not fail loudly: the indicator is never
/// load-bearing for correctness.
pub trait IndicatorOutput {
    /// Puts the pin into output mode.
    fn configure_output(&mut self, _pin: PinId) {}

    /// Drives the pin to `level`.
    fn set_level(&mut self, pin: PinId, level: Level);
}

/// Adapts an `embedded-hal` output pin to [`IndicatorOutput`].
///
/// The pin is already bound to a physical line, so the designator passed
/// by the caller is ignored.
#[derive(Debug)]
pub struct PinIndicator<P> {
    pin: P,
}

impl<P: OutputPin> PinIndicator<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> IndicatorOutput for PinIndicator<P> {
    fn set_level(&mut self, _pin: PinId, level: Level) {
        let result = match level {
            Level::Low => self.pin.set_low(),
            Level::High => self.pin.set_high(),
        };
        if let Err(e) = result {
            tracing::trace!(error = ?e, "indicator write failed");
        }
    }
}

/// Indicator for boards without an activity LED.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndicator;

impl IndicatorOutput for NoIndicator {
    fn set_level(&mut self, _pin: PinId, _level: Level) {}
}

/// The hardware capabilities owned by the identity manager.
///
/// Bundles the sample source, the indicator and the inter-sample delay
/// together with the pin designators they are driven on.
#[derive(Debug)]
pub struct Ports<A, I, D> {
    adc: A,
    indicator: I,
    delay: D,
    sample_pin: PinId,
    indicator_pin: PinId,
}

impl<A, I, D> Ports<A, I, D>
where
    A: AnalogInput,
    I: IndicatorOutput,
    D: DelayNs,
{
    /// Creates a port bundle on the default pins.
    pub fn new(adc: A, indicator: I, delay: D) -> Self {
        Self {
            adc,
            indicator,
            delay,
            sample_pin: crate::config::DEFAULT_SAMPLE_PIN,
            indicator_pin: crate::config::DEFAULT_INDICATOR_PIN,
        }
    }

    /// Rebinds the pin designators.
    pub fn assign_pins(&mut self, sample_pin: PinId, indicator_pin: PinId) {
        self.sample_pin = sample_pin;
        self.indicator_pin = indicator_pin;
    }

    /// Configures pin directions on the underlying hardware.
    pub fn configure(&mut self) {
        self.adc.configure_input(self.sample_pin);
        self.indicator.configure_output(self.indicator_pin);
    }

    #[inline]
    pub fn sample(&mut self) -> u16 {
        self.adc.read(self.sample_pin)
    }

    #[inline]
    pub fn set_indicator(&mut self, level: Level) {
        self.indicator.set_level(self.indicator_pin, level);
    }

    #[inline]
    pub fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    pub fn sample_pin(&self) -> PinId {
        self.sample_pin
    }

    pub fn indicator_pin(&self) -> PinId {
        self.indicator_pin
    }

    pub fn adc(&self) -> &A {
        &self.adc
    }
}
