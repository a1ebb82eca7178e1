//! # Raw byte persistence seam.
//!
//! [`Storage`] abstracts the durable key-value substrate the host platform
//! provides: one logical key holding the serialized queue. The engine reads
//! it once at startup and rewrites it wholesale after every mutation.
//!
//! Two backends ship with the crate:
//! - [`FileStorage`] — a single file, written atomically (temp file + rename)
//!   so a crash mid-write leaves either the new bytes or the prior bytes,
//!   never a torn snapshot;
//! - [`MemoryStorage`] — process-local, for tests and ephemeral use.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;

use crate::error::StoreError;

/// Durable storage for the serialized queue.
///
/// Implementations must be safe to call from concurrent tasks; the
/// [`ActionQueue`](crate::ActionQueue) serializes mutations, so `save` is
/// never invoked concurrently with itself.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Reads the persisted bytes, `None` if nothing was ever written.
    async fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the persisted bytes. Must be atomic: either the write fully
    /// lands or the prior bytes are retained.
    async fn save(&self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Removes the persisted bytes entirely.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed storage with atomic replace semantics.
///
/// Writes go to `<path>.tmp` first and are renamed over the target, which is
/// atomic on the platforms this engine targets.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at the given file path. Parent directories are
    /// created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The target file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.as_os_str().to_owned();
        p.push(".tmp");
        PathBuf::from(p)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage for tests and ephemeral queues.
///
/// Cloning is intentionally not provided; share it via `Arc` to simulate a
/// process restart against the same persisted bytes.
#[derive(Default)]
pub struct MemoryStorage {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.bytes.lock().map_or(None, |g| g.clone()))
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Ok(mut g) = self.bytes.lock() {
            *g = Some(bytes.to_vec());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if let Ok(mut g) = self.bytes.lock() {
            *g = None;
        }
        Ok(())
    }
}
