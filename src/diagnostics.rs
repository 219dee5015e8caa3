//! Gated diagnostic output.
//!
//! Messages are forwarded to `tracing` only when diagnostics were enabled
//! in the configuration; otherwise every call is a no-op.

use std::fmt;

/// Leveled diagnostic sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A sink that drops everything.
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn trace(&self, message: impl fmt::Display) {
        if self.enabled {
            tracing::trace!("{}", message);
        }
    }

    pub fn info(&self, message: impl fmt::Display) {
        if self.enabled {
            tracing::info!("{}", message);
        }
    }

    pub fn warn(&self, message: impl fmt::Display) {
        if self.enabled {
            tracing::warn!("{}", message);
        }
    }

    pub fn error(&self, message: impl fmt::Display) {
        if self.enabled {
            tracing::error!("{}", message);
        }
    }
}
