//! Hardware ports used during identifier generation.
//!
//! The analog sample source and the activity indicator are injected
//! capabilities rather than global pin state, so the same code runs on a
//! board HAL or against the simulated ports in [`simulated`].

mod delay;
mod ports;
pub mod simulated;

pub use delay::{NoDelay, StdDelay};
pub use ports::{AnalogInput, IndicatorOutput, Level, NoIndicator, PinId, PinIndicator, Ports};
pub use simulated::{ConstantAdc, RecordingIndicator, SimulatedAdc};
