//! Persistent storage for the identifier.
//!
//! The device filesystem is modelled as a path-keyed byte store. Opened
//! files are returned as boxed handles that close when dropped, so every
//! exit path, including early error returns, releases the handle.

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::{Faults, MemoryStorage};

use thiserror::Error;

/// Errors reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage mount failed: {0}")]
    MountFailed(String),
    #[error("storage is not mounted")]
    NotMounted,
    #[error("failed to open {path}: {reason}")]
    OpenFailed { path: String, reason: String },
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read from the start of an existing file.
    Read,
    /// Create or truncate, then write.
    Write,
}

/// An open file. Closing happens on drop.
pub trait StorageFile {
    /// Reads up to `buf.len()` bytes; `Ok(0)` means end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Writes some prefix of `bytes` and returns how much was accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, StorageError>;

    /// Makes written data durable.
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A byte store keyed by path.
pub trait Storage {
    /// Mounts the filesystem. Safe to call more than once.
    fn mount(&mut self) -> Result<(), StorageError>;

    fn exists(&self, path: &str) -> bool;

    fn open(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn StorageFile + '_>, StorageError>;

    /// Deletes `path`. Returns false if nothing was removed.
    fn remove(&mut self, path: &str) -> bool;
}

/// Reads until `buf` is full or the file ends, returning the byte count.
pub fn read_up_to(file: &mut dyn StorageFile, buf: &mut [u8]) -> Result<usize, StorageError> {
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match file.read(rest)? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Writes all of `bytes`, failing if the backend stops accepting data.
pub fn write_all(file: &mut dyn StorageFile, bytes: &[u8]) -> Result<(), StorageError> {
    let mut written = 0;
    while let Some(rest) = bytes.get(written..) {
        if rest.is_empty() {
            break;
        }
        match file.write(rest)? {
            0 => {
                return Err(StorageError::WriteFailed(format!(
                    "short write: {written} of {} bytes",
                    bytes.len()
                )))
            }
            n => written += n,
        }
    }
    Ok(())
}
