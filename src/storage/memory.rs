//! In-memory storage backend.
//!
//! Clones share one backing store, which lets a test tear a manager down
//! and bring a new one up against the same "flash" to simulate a reboot.

use super::{OpenMode, Storage, StorageError, StorageFile};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Injected failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// `mount` fails.
    pub fail_mount: bool,
    /// Opening for writing fails (full or read-only filesystem).
    pub fail_write_open: bool,
    /// Opening for reading fails.
    pub fail_read_open: bool,
    /// Writes stop being accepted once a file reaches this length.
    pub write_limit: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<String, Vec<u8>>,
    mounted: bool,
    mount_count: u32,
    open_handles: usize,
    faults: Faults,
}

/// Shared in-memory byte store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file before mount.
    pub fn with_file(self, path: &str, contents: &[u8]) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&self, path: &str, contents: &[u8]) {
        self.inner
            .borrow_mut()
            .files
            .insert(path.to_owned(), contents.to_vec());
    }

    /// Returns a copy of the file contents.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.borrow().files.get(path).cloned()
    }

    pub fn set_faults(&self, faults: Faults) {
        self.inner.borrow_mut().faults = faults;
    }

    /// Handles currently open. Zero whenever no operation is in flight.
    pub fn open_handles(&self) -> usize {
        self.inner.borrow().open_handles
    }

    pub fn mount_count(&self) -> u32 {
        self.inner.borrow().mount_count
    }

    pub fn file_count(&self) -> usize {
        self.inner.borrow().files.len()
    }
}

impl Storage for MemoryStorage {
    fn mount(&mut self) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.faults.fail_mount {
            inner.mounted = false;
            return Err(StorageError::MountFailed("injected mount failure".into()));
        }
        inner.mounted = true;
        inner.mount_count += 1;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let inner = self.inner.borrow();
        inner.mounted && inner.files.contains_key(path)
    }

    fn open(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn StorageFile + '_>, StorageError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.mounted {
            return Err(StorageError::NotMounted);
        }

        let open_failed = |reason: &str| StorageError::OpenFailed {
            path: path.to_owned(),
            reason: reason.to_owned(),
        };
        match mode {
            OpenMode::Read if inner.faults.fail_read_open => {
                return Err(open_failed("injected read failure"))
            }
            OpenMode::Read if !inner.files.contains_key(path) => {
                return Err(open_failed("no such file"))
            }
            OpenMode::Write if inner.faults.fail_write_open => {
                return Err(open_failed("injected write failure"))
            }
            OpenMode::Write => {
                inner.files.insert(path.to_owned(), Vec::new());
            }
            OpenMode::Read => {}
        }

        inner.open_handles += 1;
        Ok(Box::new(MemoryFile {
            inner: Rc::clone(&self.inner),
            path: path.to_owned(),
            mode,
            pos: 0,
        }))
    }

    fn remove(&mut self, path: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.mounted && inner.files.remove(path).is_some()
    }
}

struct MemoryFile {
    inner: Rc<RefCell<Inner>>,
    path: String,
    mode: OpenMode,
    pos: usize,
}

impl StorageFile for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        if self.mode != OpenMode::Read {
            return Err(StorageError::ReadFailed("file opened for writing".into()));
        }
        let inner = self.inner.borrow();
        let data = inner
            .files
            .get(&self.path)
            .ok_or_else(|| StorageError::ReadFailed("file removed while open".into()))?;

        let rest = data.get(self.pos..).unwrap_or_default();
        let n = rest.len().min(buf.len());
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), rest.get(..n)) {
            dst.copy_from_slice(src);
        }
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, StorageError> {
        if self.mode != OpenMode::Write {
            return Err(StorageError::WriteFailed("file opened for reading".into()));
        }
        let mut inner = self.inner.borrow_mut();
        let limit = inner.faults.write_limit;
        let data = inner
            .files
            .get_mut(&self.path)
            .ok_or_else(|| StorageError::WriteFailed("file removed while open".into()))?;

        let room = limit.map_or(bytes.len(), |limit| limit.saturating_sub(data.len()));
        let n = room.min(bytes.len());
        data.extend(bytes.iter().take(n));
        Ok(n)
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.open_handles = inner.open_handles.saturating_sub(1);
    }
}
