//! Unique Device ID Library
//!
//! Gives a microcontroller a stable, non-volatile 128-bit identifier.
//! The identifier is generated once from analog pin noise, persisted to
//! onboard storage, and read back unchanged on every later boot.
//!
//! # Architecture
//!
//! ```text
//! hal (sample pin, indicator) ──▶ entropy ──▶ identity ◀──▶ storage
//! ```
//!
//! - [`entropy::EntropyAccumulator`] folds timed analog samples into a
//!   rotating 32-bit accumulator and yields one byte per
//!   `rounds_per_byte` samples.
//! - [`identity::IdentityManager`] loads the identifier at startup,
//!   generates and persists one on request, and can wipe it.
//!
//! # Design Principles
//!
//! - **Durable or absent**: an identifier that cannot be persisted is
//!   discarded, never reported as present.
//! - **Injected hardware**: pins, delays and storage are traits, so the
//!   lifecycle runs unchanged against simulated ports.
//! - **No cryptographic claims**: the mixing is deliberately simple and its
//!   run time is proportional to rounds × delay.
//!
//! # Example
//!
//! ```no_run
//! use unique_device_id::{
//!     hal::{NoIndicator, Ports, SimulatedAdc, StdDelay},
//!     storage::FsStorage,
//!     IdentityConfig, IdentityManager,
//! };
//!
//! let ports = Ports::new(SimulatedAdc::from_os_entropy(), NoIndicator, StdDelay);
//! let storage = FsStorage::new("device-storage");
//! let mut manager = IdentityManager::new(IdentityConfig::default(), storage, ports);
//!
//! if !manager.has_id() {
//!     manager.generate_new_id().unwrap();
//! }
//!
//! let mut id = [0u8; 16];
//! assert!(manager.get_bytes(&mut id));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod diagnostics;
pub mod entropy;
pub mod hal;
pub mod identity;
pub mod storage;

// Re-export commonly used types at crate root
pub use config::{ConfigError, FileConfig, IdentityConfig};
pub use diagnostics::Diagnostics;
pub use entropy::EntropyAccumulator;
pub use hal::{AnalogInput, IndicatorOutput, Level, Ports};
pub use identity::{DeviceIdentifier, IdentityError, IdentityManager, IdentityState, ID_LEN};
pub use storage::{FsStorage, MemoryStorage, OpenMode, Storage, StorageError, StorageFile};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
