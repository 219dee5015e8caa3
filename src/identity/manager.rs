//! Load, generate and persist lifecycle of the device identifier.
//!
//! ```text
//!                 load ok
//! Uninitialized ──────────▶ Loaded ◀─┐
//!       │                     │      │ generate + persist ok
//!       │ missing / corrupt   │ remove
//!       ▼                     ▼      │
//!     Absent ◀──────────── Absent ───┘
//! ```
//!
//! An identifier that could not be persisted is never reported as present.

use super::{DeviceIdentifier, IdentityError, ID_LEN};
use crate::config::IdentityConfig;
use crate::diagnostics::Diagnostics;
use crate::entropy::EntropyAccumulator;
use crate::hal::{AnalogInput, IndicatorOutput, Level, Ports};
use crate::storage::{self, OpenMode, Storage};
use embedded_hal::delay::DelayNs;

/// Observable identity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    /// `initialize` has not completed yet.
    Uninitialized,
    /// A valid identifier is held in memory and on storage.
    Loaded,
    /// No identifier is available.
    Absent,
}

/// Owns the device identifier together with the storage and ports
/// needed to load or create it.
///
/// All operations run to completion on the calling thread. Generation
/// blocks for about `16 * rounds_per_byte` sample delays.
pub struct IdentityManager<S, A, I, D> {
    config: IdentityConfig,
    storage: S,
    ports: Ports<A, I, D>,
    entropy: EntropyAccumulator,
    id: DeviceIdentifier,
    state: IdentityState,
    diag: Diagnostics,
}

impl<S, A, I, D> IdentityManager<S, A, I, D>
where
    S: Storage,
    A: AnalogInput,
    I: IndicatorOutput,
    D: DelayNs,
{
    /// Creates a manager and immediately runs [`initialize`](Self::initialize).
    ///
    /// A configuration that fails [`IdentityConfig::validate`] is still
    /// applied; a round count of zero is raised to one.
    pub fn new(config: IdentityConfig, storage: S, ports: Ports<A, I, D>) -> Self {
        let diag = Diagnostics::new(config.diagnostics);
        let mut manager = Self {
            entropy: EntropyAccumulator::new(config.rounds_per_byte, diag),
            config: config.clone(),
            storage,
            ports,
            id: DeviceIdentifier::zeroed(),
            state: IdentityState::Uninitialized,
            diag,
        };
        manager.initialize(config);
        manager
    }

    /// Applies `config`, mounts storage, configures the pins and looks for
    /// a persisted identifier.
    ///
    /// Afterwards the state is either [`IdentityState::Loaded`] or
    /// [`IdentityState::Absent`].
    pub fn initialize(&mut self, config: IdentityConfig) {
        self.diag = Diagnostics::new(config.diagnostics);
        self.ports
            .assign_pins(config.sample_pin, config.indicator_pin);
        self.entropy = EntropyAccumulator::new(config.rounds_per_byte, self.diag);
        self.clear_id();
        self.state = IdentityState::Uninitialized;
        if let Err(e) = config.validate() {
            self.diag.warn(format_args!("invalid configuration: {e}"));
        }
        self.config = config;

        let mounted = match self.storage.mount() {
            Ok(()) => true,
            Err(e) => {
                self.diag
                    .error(format_args!("storage mount failed: {e}"));
                false
            }
        };
        self.ports.configure();

        self.diag.info("looking for device ID");
        if mounted {
            let path = self.config.storage_path.clone();
            let _ = self.load_from_storage(&path);
        } else {
            self.clear_id();
            self.ports.set_indicator(Level::High);
        }
    }

    /// True iff a valid identifier is loaded.
    #[inline]
    pub fn has_id(&self) -> bool {
        self.state == IdentityState::Loaded
    }

    /// Copies the identifier into `out`.
    ///
    /// Returns false and leaves `out` untouched when no identifier is loaded.
    pub fn get_bytes(&self, out: &mut [u8; ID_LEN]) -> bool {
        match self.id() {
            Some(id) => {
                out.copy_from_slice(id.as_bytes());
                true
            }
            None => false,
        }
    }

    /// The loaded identifier, if any.
    pub fn id(&self) -> Option<&DeviceIdentifier> {
        self.has_id().then_some(&self.id)
    }

    pub fn state(&self) -> IdentityState {
        self.state
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn ports(&self) -> &Ports<A, I, D> {
        &self.ports
    }

    /// Creates a fresh identifier from the entropy accumulator and persists it.
    ///
    /// Primes the accumulator first if needed. If the identifier cannot be
    /// persisted it is discarded and the manager reverts to absent.
    pub fn generate_new_id(&mut self) -> Result<DeviceIdentifier, IdentityError> {
        self.diag.info("creating new unique device ID");
        if !self.entropy.is_initialized() {
            self.entropy.prime(&mut self.ports);
        }

        let mut bytes = [0u8; ID_LEN];
        self.entropy.fill_bytes(&mut self.ports, &mut bytes);
        self.id = DeviceIdentifier::new(bytes);
        self.state = IdentityState::Loaded;
        self.diag
            .info(format_args!("new ID created: {}", self.id));

        let path = self.config.storage_path.clone();
        if let Err(e) = self.persist_to_storage(&path) {
            self.clear_id();
            return Err(e);
        }
        Ok(self.id)
    }

    /// Returns the loaded identifier, generating one if none is present.
    pub fn ensure_id(&mut self) -> Result<DeviceIdentifier, IdentityError> {
        match self.id() {
            Some(id) => Ok(*id),
            None => self.generate_new_id(),
        }
    }

    /// Forgets the identifier in memory and deletes the stored copy.
    ///
    /// Returns true iff a stored copy existed and was deleted. Memory is
    /// cleared either way.
    pub fn remove_id(&mut self) -> bool {
        self.diag.info("wiping device ID from storage");
        self.clear_id();

        let path = self.config.storage_path.clone();
        if self.storage.remove(&path) {
            self.diag.info("ID file removed");
            true
        } else {
            self.diag.info("no ID file existed");
            false
        }
    }

    /// Writes the loaded identifier to `path` as exactly 16 raw bytes.
    pub fn persist_to_storage(&mut self, path: &str) -> Result<(), IdentityError> {
        if !self.has_id() {
            return Err(IdentityError::NotLoaded);
        }

        let result = self.write_identifier(path);
        match &result {
            Ok(()) => self.diag.info("device ID saved"),
            Err(e) => self
                .diag
                .error(format_args!("error storing device ID at {path}: {e}")),
        }
        result
    }

    /// Reads the identifier stored at `path`.
    ///
    /// The record must be exactly 16 bytes; anything else leaves the manager
    /// absent. The indicator is held low for the duration of the attempt.
    pub fn load_from_storage(&mut self, path: &str) -> Result<DeviceIdentifier, IdentityError> {
        self.ports.set_indicator(Level::Low);

        let result = self.read_identifier(path);
        match &result {
            Ok(id) => {
                self.id = *id;
                self.state = IdentityState::Loaded;
                self.diag.info("found existing ID");
            }
            Err(e @ IdentityError::NoStoredIdentifier) => {
                self.clear_id();
                self.diag.info(format_args!("{e} at {path}"));
            }
            Err(e @ IdentityError::CorruptOrShortRead { .. }) => {
                self.clear_id();
                self.diag.warn(format_args!("bad ID file at {path}: {e}"));
            }
            Err(e) => {
                self.clear_id();
                self.diag
                    .error(format_args!("failed to read ID file at {path}: {e}"));
            }
        }

        self.ports.set_indicator(Level::High);
        result
    }

    fn write_identifier(&mut self, path: &str) -> Result<(), IdentityError> {
        let mut file = self.storage.open(path, OpenMode::Write)?;
        storage::write_all(file.as_mut(), self.id.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn read_identifier(&mut self, path: &str) -> Result<DeviceIdentifier, IdentityError> {
        if !self.storage.exists(path) {
            return Err(IdentityError::NoStoredIdentifier);
        }

        // One spare byte so an oversized record is detected, not truncated.
        let mut buf = [0u8; ID_LEN + 1];
        let count = {
            let mut file = self.storage.open(path, OpenMode::Read)?;
            storage::read_up_to(file.as_mut(), &mut buf)?
        };
        let record = buf.get(..count).unwrap_or_default();
        DeviceIdentifier::try_from(record)
    }

    fn clear_id(&mut self) {
        self.id = DeviceIdentifier::zeroed();
        self.state = IdentityState::Absent;
    }
}

impl<S, A, I, D> std::fmt::Debug for IdentityManager<S, A, I, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityManager")
            .field("state", &self.state)
            .field("storage_path", &self.config.storage_path)
            .field("entropy_initialized", &self.entropy.is_initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{ConstantAdc, NoDelay, RecordingIndicator, SimulatedAdc};
    use crate::storage::{Faults, MemoryStorage};
    use proptest::prelude::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    const PATH: &str = "/unique_id_128";

    type TestManager = IdentityManager<MemoryStorage, SimulatedAdc, RecordingIndicator, NoDelay>;

    fn fast_config() -> IdentityConfig {
        IdentityConfig::new(false).with_rounds_per_byte(8)
    }

    fn boot(storage: &MemoryStorage, seed: u64) -> (TestManager, RecordingIndicator) {
        let indicator = RecordingIndicator::new();
        let ports = Ports::new(
            SimulatedAdc::from_seed(seed),
            indicator.clone(),
            NoDelay::new(),
        );
        let manager = IdentityManager::new(fast_config(), storage.clone(), ports);
        (manager, indicator)
    }

    #[test]
    fn test_fresh_storage_is_absent() {
        let storage = MemoryStorage::new();
        let (manager, _) = boot(&storage, 1);

        assert!(!manager.has_id());
        assert_eq!(manager.state(), IdentityState::Absent);
        assert!(manager.id().is_none());
        assert_eq!(storage.mount_count(), 1);
    }

    #[test]
    fn test_existing_id_is_loaded() {
        let stored = [0xA5u8; ID_LEN];
        let storage = MemoryStorage::new().with_file(PATH, &stored);
        let (manager, _) = boot(&storage, 1);

        assert!(manager.has_id());
        let mut out = [0u8; ID_LEN];
        assert!(manager.get_bytes(&mut out));
        assert_eq!(out, stored);
        assert_eq!(storage.open_handles(), 0);
    }

    #[test]
    fn test_generate_persists_exact_bytes() {
        let storage = MemoryStorage::new();
        let (mut manager, _) = boot(&storage, 2);

        let id = manager.generate_new_id().unwrap();

        assert!(manager.has_id());
        assert_eq!(storage.contents(PATH), Some(id.as_bytes().to_vec()));
        assert_eq!(storage.open_handles(), 0);
    }

    #[test]
    fn test_generate_primes_once() {
        let storage = MemoryStorage::new();
        let (mut manager, _) = boot(&storage, 3);

        manager.generate_new_id().unwrap();
        // 4 priming bytes + 16 identifier bytes, 8 rounds each.
        assert_eq!(manager.ports().adc().reads(), 20 * 8);

        manager.generate_new_id().unwrap();
        assert_eq!(manager.ports().adc().reads(), 36 * 8);
    }

    #[test]
    fn test_failed_persist_reverts_to_absent() {
        let storage = MemoryStorage::new();
        let (mut manager, _) = boot(&storage, 4);
        storage.set_faults(Faults {
            fail_write_open: true,
            ..Default::default()
        });

        let result = manager.generate_new_id();

        assert!(matches!(result, Err(IdentityError::StorageUnavailable(_))));
        assert!(!manager.has_id());
        let mut out = [0x11u8; ID_LEN];
        assert!(!manager.get_bytes(&mut out));
        assert_eq!(out, [0x11u8; ID_LEN]);
    }

    #[test]
    fn test_short_write_reverts_to_absent() {
        let storage = MemoryStorage::new();
        let (mut manager, _) = boot(&storage, 5);
        storage.set_faults(Faults {
            write_limit: Some(10),
            ..Default::default()
        });

        assert!(manager.generate_new_id().is_err());
        assert!(!manager.has_id());
        assert_eq!(storage.open_handles(), 0);
    }

    #[test]
    fn test_mount_failure_leaves_absent() {
        let storage = MemoryStorage::new().with_file(PATH, &[1u8; ID_LEN]);
        storage.set_faults(Faults {
            fail_mount: true,
            ..Default::default()
        });
        let (manager, indicator) = boot(&storage, 6);

        assert_eq!(manager.state(), IdentityState::Absent);
        assert_eq!(indicator.last_level(), Some(Level::High));
    }

    #[test]
    fn test_read_open_failure_leaves_absent() {
        let storage = MemoryStorage::new().with_file(PATH, &[1u8; ID_LEN]);
        storage.set_faults(Faults {
            fail_read_open: true,
            ..Default::default()
        });
        let (mut manager, _) = boot(&storage, 7);

        assert!(!manager.has_id());
        assert!(matches!(
            manager.load_from_storage(PATH),
            Err(IdentityError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_remove_reports_whether_file_existed() {
        let storage = MemoryStorage::new();
        let (mut manager, _) = boot(&storage, 8);

        assert!(!manager.remove_id());

        manager.generate_new_id().unwrap();
        assert!(manager.remove_id());
        assert!(!manager.has_id());
        assert!(storage.contents(PATH).is_none());
        assert!(matches!(
            manager.load_from_storage(PATH),
            Err(IdentityError::NoStoredIdentifier)
        ));
        assert!(!manager.has_id());
    }

    #[test]
    fn test_persist_without_id_rejected() {
        let storage = MemoryStorage::new();
        let (mut manager, _) = boot(&storage, 9);

        assert!(matches!(
            manager.persist_to_storage(PATH),
            Err(IdentityError::NotLoaded)
        ));
        assert!(storage.contents(PATH).is_none());
    }

    #[test]
    fn test_load_drives_indicator_low_then_high() {
        let storage = MemoryStorage::new().with_file(PATH, &[3u8; ID_LEN]);
        let (mut manager, indicator) = boot(&storage, 10);
        indicator.clear();

        manager.load_from_storage(PATH).unwrap();

        assert_eq!(indicator.writes(), vec![(2, Level::Low), (2, Level::High)]);
    }

    #[test]
    fn test_pins_follow_config() {
        let storage = MemoryStorage::new();
        let indicator = RecordingIndicator::new();
        let ports = Ports::new(ConstantAdc::new(0), indicator.clone(), NoDelay::new());
        let config = fast_config().with_pins(5, 16);

        let manager = IdentityManager::new(config, storage, ports);

        assert_eq!(manager.ports().sample_pin(), 5);
        assert_eq!(manager.ports().indicator_pin(), 16);
        assert_eq!(manager.ports().adc().configured_pin(), Some(5));
        assert_eq!(indicator.configured_pins(), vec![16]);
        assert!(indicator.writes().iter().all(|&(pin, _)| pin == 16));
    }

    #[test]
    fn test_custom_storage_path() {
        let storage = MemoryStorage::new();
        let ports = Ports::new(SimulatedAdc::from_seed(12), RecordingIndicator::new(), NoDelay::new());
        let config = fast_config().with_storage_path("/ids/device");
        let mut manager = IdentityManager::new(config, storage.clone(), ports);

        manager.generate_new_id().unwrap();

        assert!(storage.contents("/ids/device").is_some());
        assert!(storage.contents(PATH).is_none());
    }

    #[test]
    fn test_ensure_id_keeps_loaded_id() {
        let storage = MemoryStorage::new();
        let (mut manager, _) = boot(&storage, 13);

        let first = manager.ensure_id().unwrap();
        let reads = manager.ports().adc().reads();
        let second = manager.ensure_id().unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.ports().adc().reads(), reads);
    }

    #[test]
    fn test_zero_rounds_config_uses_one_round() {
        let storage = MemoryStorage::new();
        let ports = Ports::new(SimulatedAdc::from_seed(16), RecordingIndicator::new(), NoDelay::new());
        let config = fast_config().with_rounds_per_byte(0);
        let mut manager = IdentityManager::new(config, storage, ports);

        manager.generate_new_id().unwrap();

        assert_eq!(manager.ports().adc().reads(), 20);
        assert_eq!(manager.config().rounds_per_byte, 0);
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn has_line(logs: &str, level: &str, message: &str) -> bool {
        logs.lines()
            .any(|line| line.contains(level) && line.contains(message))
    }

    fn verbose_boot(storage: &MemoryStorage) -> TestManager {
        let ports = Ports::new(SimulatedAdc::from_seed(17), RecordingIndicator::new(), NoDelay::new());
        let config = IdentityConfig::new(true).with_rounds_per_byte(8);
        IdentityManager::new(config, storage.clone(), ports)
    }

    #[test]
    fn test_corrupt_record_logs_warning() {
        let storage = MemoryStorage::new().with_file(PATH, &[0u8; 8]);
        let logs = capture_logs(|| {
            verbose_boot(&storage);
        });

        assert!(has_line(&logs, "WARN", "bad ID file"), "{logs}");
    }

    #[test]
    fn test_missing_record_logs_info() {
        let storage = MemoryStorage::new();
        let logs = capture_logs(|| {
            let mut manager = verbose_boot(&storage);
            manager.remove_id();
        });

        assert!(has_line(&logs, "INFO", "no stored identifier"), "{logs}");
        assert!(has_line(&logs, "INFO", "no ID file existed"), "{logs}");
        assert!(!logs.contains("WARN") && !logs.contains("ERROR"), "{logs}");
    }

    #[test]
    fn test_failed_write_open_logs_error() {
        let storage = MemoryStorage::new();
        storage.set_faults(Faults {
            fail_write_open: true,
            ..Default::default()
        });
        let logs = capture_logs(|| {
            let mut manager = verbose_boot(&storage);
            assert!(manager.generate_new_id().is_err());
        });

        assert!(has_line(&logs, "ERROR", "error storing device ID"), "{logs}");
    }

    #[test]
    fn test_disabled_diagnostics_log_nothing() {
        let storage = MemoryStorage::new().with_file(PATH, &[0u8; 8]);
        storage.set_faults(Faults {
            fail_write_open: true,
            ..Default::default()
        });
        let logs = capture_logs(|| {
            let (mut manager, _) = boot(&storage, 18);
            assert!(manager.generate_new_id().is_err());
            manager.remove_id();
        });

        assert!(logs.is_empty(), "{logs}");
    }

    proptest! {
        #[test]
        fn prop_wrong_length_record_rejected(len in 0usize..64) {
            prop_assume!(len != ID_LEN);
            let storage = MemoryStorage::new().with_file(PATH, &vec![0x5Au8; len]);
            let (manager, _) = boot(&storage, 14);

            prop_assert!(!manager.has_id());
            let mut out = [0xEEu8; ID_LEN];
            prop_assert!(!manager.get_bytes(&mut out));
            prop_assert_eq!(out, [0xEEu8; ID_LEN]);
            prop_assert_eq!(storage.open_handles(), 0);
            // Never repaired automatically.
            prop_assert_eq!(storage.contents(PATH).map(|c| c.len()), Some(len));
        }

        #[test]
        fn prop_any_stored_id_round_trips(bytes in proptest::array::uniform16(any::<u8>())) {
            let storage = MemoryStorage::new().with_file(PATH, &bytes);
            let (manager, _) = boot(&storage, 15);

            let mut out = [0u8; ID_LEN];
            prop_assert!(manager.get_bytes(&mut out));
            prop_assert_eq!(out, bytes);
        }
    }
}
