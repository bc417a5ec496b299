//! Single-file JSON document store.
//!
//! The whole [`Dataset`] lives in one JSON file. Every read loads the
//! complete file and every write replaces it. Writes go to a sibling
//! temporary file which is synced and then renamed over the dataset, so a
//! reader never observes a partially written document and a failed write
//! leaves the previous content in place.
//!
//! Two locks are involved:
//! - an exclusive advisory lock on `<file>.lock`, held for the lifetime of
//!   the store, keeps other processes out;
//! - an in-process reader/writer lock orders loads and writes between
//!   threads. [`DocumentStore::update`] holds the write side across load,
//!   mutation and write, so read-modify-write cycles never interleave.

use crate::error::{Result, StoreError};
use crate::types::Dataset;
use fs2::FileExt;
use parking_lot::RwLock;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Path of the dataset file.
    pub path: PathBuf,

    /// Whether to create the dataset if it doesn't exist.
    pub create_if_missing: bool,

    /// Pretty-print the JSON on disk.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./database.json"),
            create_if_missing: true,
            pretty: false,
        }
    }
}

/// Owner of the on-disk dataset.
pub struct DocumentStore {
    config: StoreConfig,

    /// Lock file for exclusive access across processes.
    lock_file: File,

    /// Readers share, writers exclude.
    lock: RwLock<()>,
}

impl DocumentStore {
    /// Open the store at `config.path`, materializing an empty dataset if
    /// the file is absent.
    pub fn open(config: StoreConfig) -> Result<Self> {
        if !Self::exists(&config.path)? && !config.create_if_missing {
            return Err(StoreError::NotInitialized);
        }

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = Self::acquire_lock(&config.path)?;

        let store = Self {
            config,
            lock_file,
            lock: RwLock::new(()),
        };
        store.ensure()?;

        info!(path = %store.config.path.display(), "Connected to store");
        Ok(store)
    }

    /// Write an empty dataset if the file does not exist yet. Idempotent.
    pub fn ensure(&self) -> Result<()> {
        let _lock = self.lock.write();

        if Self::exists(&self.config.path)? {
            return Ok(());
        }

        info!(path = %self.config.path.display(), "Dataset not found, initializing");
        self.write_unlocked(&Dataset::default())
    }

    /// Read and parse the whole dataset.
    pub fn load(&self) -> Result<Dataset> {
        let _lock = self.lock.read();
        self.load_unlocked()
    }

    /// Overwrite the whole dataset.
    pub fn replace(&self, dataset: &Dataset) -> Result<()> {
        let _lock = self.lock.write();
        self.write_unlocked(dataset)
    }

    /// Run `f` against a freshly loaded dataset under the shared lock.
    pub fn read<T>(&self, f: impl FnOnce(&Dataset) -> Result<T>) -> Result<T> {
        let _lock = self.lock.read();
        let dataset = self.load_unlocked()?;
        f(&dataset)
    }

    /// Load, mutate and persist while holding the exclusive lock.
    ///
    /// If `f` fails nothing is written and its error is returned.
    pub fn update<T>(&self, f: impl FnOnce(&mut Dataset) -> Result<T>) -> Result<T> {
        let _lock = self.lock.write();
        let mut dataset = self.load_unlocked()?;
        let output = f(&mut dataset)?;
        self.write_unlocked(&dataset)?;
        Ok(output)
    }

    /// Path of the dataset file.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn load_unlocked(&self) -> Result<Dataset> {
        let bytes = fs::read(&self.config.path)?;

        let dataset: Dataset = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path = %self.config.path.display(), error = %e, "Dataset failed to parse");
            StoreError::Corruption(e.to_string())
        })?;

        dataset.check_keys().map_err(|msg| {
            warn!(path = %self.config.path.display(), "Dataset keys inconsistent: {}", msg);
            StoreError::Corruption(msg)
        })?;

        Ok(dataset)
    }

    fn write_unlocked(&self, dataset: &Dataset) -> Result<()> {
        let encoded = if self.config.pretty {
            serde_json::to_vec_pretty(dataset)?
        } else {
            serde_json::to_vec(dataset)?
        };

        let temp_path = Self::sibling(&self.config.path, "tmp");
        let result = (|| -> Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.config.path)?;
            Ok(())
        })();

        if let Err(err) = result {
            // Best-effort cleanup; the dataset file itself was never touched.
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        debug!(
            users = dataset.users.len(),
            chirps = dataset.chirps.len(),
            bytes = encoded.len(),
            "Dataset written"
        );
        Ok(())
    }

    fn exists(path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// `<path>.<suffix>`, keeping the original extension.
    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name: OsString = path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_path = Self::sibling(path, "lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}
