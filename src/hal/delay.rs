//! Delay providers for the inter-sample pause.

use embedded_hal::delay::DelayNs;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Blocking delay backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Delay that returns immediately and only accounts for the time requested.
///
/// Clones share the same counter, so a test can keep a handle after moving
/// the delay into a manager.
#[derive(Debug, Default, Clone)]
pub struct NoDelay {
    requested_ns: Rc<Cell<u64>>,
}

impl NoDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total delay requested so far, in nanoseconds.
    pub fn requested_ns(&self) -> u64 {
        self.requested_ns.get()
    }
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.requested_ns
            .set(self.requested_ns.get().saturating_add(u64::from(ns)));
    }
}
