/*!
 * Durable Stores
 * Whole-blob backends that survive a reset of volatile state
 */

use crate::core::errors::{PersistenceError, PersistenceResult};
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

/// A single durable blob, replaced as a whole
///
/// `write` must be atomic: after a crash the store holds either the previous
/// blob or the new one, never a mix.
#[cfg_attr(test, mockall::automock)]
pub trait DurableStore {
    /// Current blob, or `None` if nothing was ever written
    fn read(&self) -> PersistenceResult<Option<Vec<u8>>>;

    /// Replace the blob
    fn write(&self, bytes: &[u8]) -> PersistenceResult<()>;
}

/// Shared in-memory blob
///
/// Clones share the same slot, so a test can keep one handle while the
/// kernel owns another, and drop every kernel to simulate a volatile reset.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `bytes`
    pub fn with_blob(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(bytes.into()))),
        }
    }

    /// Copy of the current blob
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.blob.lock().clone()
    }
}

impl DurableStore for MemoryStore {
    fn read(&self) -> PersistenceResult<Option<Vec<u8>>> {
        Ok(self.blob.lock().clone())
    }

    fn write(&self, bytes: &[u8]) -> PersistenceResult<()> {
        *self.blob.lock() = Some(bytes.to_vec());
        Ok(())
    }
}

/// Blob kept in one file, replaced via a synced temp file and a rename
///
/// The temp file gets a unique name in the target's directory, so the rename
/// stays on one filesystem and concurrent writers never share a staging file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl DurableStore for FileStore {
    fn read(&self) -> PersistenceResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::io(e, format!("reading {}", self.path.display()))),
        }
    }

    fn write(&self, bytes: &[u8]) -> PersistenceResult<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent)
            .map_err(|e| PersistenceError::io(e, format!("creating {}", parent.display())))?;

        let temp = NamedTempFile::new_in(parent)
            .map_err(|e| PersistenceError::io(e, format!("creating temp file in {}", parent.display())))?;
        let mut file = temp.as_file();
        file.write_all(bytes)
            .map_err(|e| PersistenceError::io(e, format!("writing temp file for {}", self.path.display())))?;
        file.sync_all()
            .map_err(|e| PersistenceError::io(e, format!("syncing temp file for {}", self.path.display())))?;

        temp.persist(&self.path).map_err(|e| {
            PersistenceError::io(e.error, format!("renaming temp file to {}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "durable state written");
        Ok(())
    }
}
