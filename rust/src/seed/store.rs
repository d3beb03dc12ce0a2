//! Durable home for the single provisioned seed.
//!
//! Callers depend on the [`SeedStore`] trait only. `FileSeedStore` is what the
//! service runs with; `MemorySeedStore` backs tests and embedders that keep
//! the seed elsewhere.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tempfile::NamedTempFile;

use crate::seed::{Seed, SeedError};

pub trait SeedStore: Send + Sync {
    /// Replaces whatever seed is stored. Last writer wins.
    fn write(&self, seed: &Seed) -> Result<(), SeedError>;

    /// Fails with [`SeedError::NotProvisioned`] until a seed has been written.
    fn read(&self) -> Result<Seed, SeedError>;

    fn exists(&self) -> bool;
}

/// Stores the seed as hex text in one file.
///
/// Writes land in a temporary file next to the target and are renamed over
/// it, so a concurrent reader sees either the previous seed or the new one.
#[derive(Debug)]
pub struct FileSeedStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeedStore for FileSeedStore {
    fn write(&self, seed: &Seed) -> Result<(), SeedError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|e| SeedError::Storage(format!("{}: {e}", parent.display())))?;

        let mut staged = NamedTempFile::new_in(&parent)
            .map_err(|e| SeedError::Storage(format!("{}: {e}", parent.display())))?;
        staged
            .write_all(seed.as_hex().as_bytes())
            .map_err(|e| SeedError::Storage(format!("{e}")))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| SeedError::Storage(format!("{e}")))?;
        staged
            .persist(&self.path)
            .map_err(|e| SeedError::Storage(format!("{}: {}", self.path.display(), e.error)))?;

        tracing::debug!(path = %self.path.display(), "seed written");
        Ok(())
    }

    fn read(&self) -> Result<Seed, SeedError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(SeedError::NotProvisioned),
            Err(e) => return Err(SeedError::Storage(format!("{}: {e}", self.path.display()))),
        };
        Seed::parse(text.trim())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Keeps the seed in process memory.
#[derive(Debug, Default)]
pub struct MemorySeedStore {
    slot: RwLock<Option<Seed>>,
}

impl MemorySeedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeedStore for MemorySeedStore {
    fn write(&self, seed: &Seed) -> Result<(), SeedError> {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(seed.clone());
        Ok(())
    }

    fn read(&self) -> Result<Seed, SeedError> {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone().ok_or(SeedError::NotProvisioned)
    }

    fn exists(&self) -> bool {
        self.slot
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }
}
