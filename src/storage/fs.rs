//! Host filesystem backend.
//!
//! Logical device paths such as `/unique_id_128` are mapped to files
//! under a root directory.

use super::{OpenMode, Storage, StorageError, StorageFile};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Storage rooted at a host directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    mounted: bool,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path backing a logical device path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for FsStorage {
    fn mount(&mut self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            StorageError::MountFailed(format!("{}: {e}", self.root.display()))
        })?;
        self.mounted = true;
        tracing::debug!(root = %self.root.display(), "filesystem storage mounted");
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.mounted && self.resolve(path).is_file()
    }

    fn open(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn StorageFile + '_>, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        let host_path = self.resolve(path);
        let file = match mode {
            OpenMode::Read => File::open(&host_path),
            OpenMode::Write => File::create(&host_path),
        }
        .map_err(|e| StorageError::OpenFailed {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(FsFile { file }))
    }

    fn remove(&mut self, path: &str) -> bool {
        self.mounted && fs::remove_file(self.resolve(path)).is_ok()
    }
}

struct FsFile {
    file: File,
}

impl StorageFile for FsFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.file
            .read(buf)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, StorageError> {
        self.file
            .write(bytes)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.file
            .sync_all()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }
}
