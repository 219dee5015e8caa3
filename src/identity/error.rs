//! Identity lifecycle errors.
//!
//! None of these are fatal. Each one leaves the manager in the absent
//! state, and whether to retry generation is up to the caller.

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Mount, open, read or write failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// A stored record exists but is not exactly 16 bytes.
    #[error("stored identifier is corrupt ({len} bytes read)")]
    CorruptOrShortRead { len: usize },

    /// Nothing stored yet. Expected on a fresh device.
    #[error("no stored identifier")]
    NoStoredIdentifier,

    /// Persisting was requested with no identifier in memory.
    #[error("no identifier loaded")]
    NotLoaded,
}
