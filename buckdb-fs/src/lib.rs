//! # buckdb-fs
//!
//! A second, independent [`buckdb::Driver`] implementation backed by the filesystem: one
//! human-inspectable `.dat` file per raw entry, the way [kivis-fs] stores one file per
//! record. It exists to prove out the driver trait boundary with a real second backend,
//! not as a production target for `lmdb://`-scale workloads.
//!
//! Every raw, already bucket-prefixed key (see `buckdb`'s bucket manager) is mapped to a
//! filename by percent-encoding its bytes; a value is stored as a single-row CSV record
//! holding its hex text, so an entry can be opened and read in a text editor.
//!
//! [kivis-fs]: https://crates.io/crates/kivis-fs

mod filename;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use buckdb::{DatabaseFlags, Driver, DriverFactory, Error, RawEntry, RawTransaction, Result};

use crate::filename::{decode_value, encode_value, filename_to_key, io_not_found, key_to_filename};

/// Options accepted by the `fs` driver beyond the shared [`DatabaseFlags`] bitset: mirrors
/// [`DatabaseFlags::DISABLE_SYNC`] with an explicit type for callers constructing a
/// [`FsDriver`] directly (bypassing URI parsing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsDriverConfig {
    /// Skip `fsync`-ing each entry file after a write. Advisory, matches
    /// [`DatabaseFlags::DISABLE_SYNC`].
    pub disable_sync: bool,
}

impl Default for FsDriverConfig {
    fn default() -> Self {
        FsDriverConfig { disable_sync: false }
    }
}

/// Filesystem-backed [`Driver`]: one data directory, one `.dat` file per raw entry.
///
/// Read-only transactions snapshot the directory at start; a [`parking_lot::Mutex`]
/// serializes read-write transactions, matching the "one active writer" contract every
/// driver must uphold. Writes are buffered in memory and only touch disk on
/// [`RawTransaction::commit`].
pub struct FsDriver {
    dir: PathBuf,
    writer_lock: Mutex<()>,
    config: FsDriverConfig,
}

impl FsDriver {
    /// Opens (or, with `create_if_not_exists`, creates) `dir` as the data directory.
    pub fn open(dir: impl Into<PathBuf>, flags: DatabaseFlags, config: FsDriverConfig) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            if !flags.contains(DatabaseFlags::CREATE_IF_NOT_EXISTS) {
                return Err(Error::ConnectionFailed(format!(
                    "{} does not exist and CreateIfNotExists was not set",
                    dir.display()
                )));
            }
            fs::create_dir_all(&dir).map_err(Error::from_driver)?;
        } else if !dir.is_dir() {
            return Err(Error::ConnectionFailed(format!(
                "{} exists and is not a directory",
                dir.display()
            )));
        }
        Ok(FsDriver {
            dir,
            writer_lock: Mutex::new(()),
            config,
        })
    }

    fn read_all(&self) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        read_directory(&self.dir)
    }
}

fn read_directory(dir: &Path) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
    let mut store = BTreeMap::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if io_not_found(&err) => return Ok(store),
        Err(err) => return Err(Error::from_driver(err)),
    };
    for entry in entries {
        let entry = entry.map_err(Error::from_driver)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(key) = filename_to_key(name) else { continue };
        let text = fs::read_to_string(entry.path()).map_err(Error::from_driver)?;
        let value = decode_value(&text)?;
        store.insert(key, value);
    }
    Ok(store)
}

impl Driver for FsDriver {
    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn read_only_transaction(&self) -> Result<Box<dyn RawTransaction + '_>> {
        let snapshot = self.read_all()?;
        tracing::trace!(entries = snapshot.len(), "opened read-only fs transaction");
        Ok(Box::new(FsReadTransaction { snapshot }))
    }

    fn read_write_transaction(&self) -> Result<Box<dyn RawTransaction + '_>> {
        let guard = self.writer_lock.lock();
        let base = self.read_all()?;
        tracing::trace!("opened read-write fs transaction");
        Ok(Box::new(FsWriteTransaction {
            driver: self,
            _writer_guard: guard,
            base,
            buffer: BTreeMap::new(),
        }))
    }
}

struct FsReadTransaction {
    snapshot: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl RawTransaction for FsReadTransaction {
    fn is_read_only(&self) -> bool {
        true
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot.get(key).cloned())
    }

    fn set(&mut self, _key: Vec<u8>, _value: Vec<u8>) -> Result<()> {
        Err(Error::ReadOnlyViolation)
    }

    fn remove(&mut self, _key: &[u8]) -> Result<()> {
        Err(Error::ReadOnlyViolation)
    }

    fn iter_prefix<'a>(
        &'a self,
        prefix: Vec<u8>,
    ) -> Result<Box<dyn Iterator<Item = Result<RawEntry>> + 'a>> {
        Ok(Box::new(
            self.snapshot
                .range(prefix.clone()..)
                .take_while(move |(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| Ok((k.clone(), v.clone()))),
        ))
    }

    fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

struct FsWriteTransaction<'a> {
    driver: &'a FsDriver,
    _writer_guard: parking_lot::MutexGuard<'a, ()>,
    base: BTreeMap<Vec<u8>, Vec<u8>>,
    buffer: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> RawTransaction for FsWriteTransaction<'a> {
    fn is_read_only(&self) -> bool {
        false
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(buffered) = self.buffer.get(key) {
            return Ok(buffered.clone());
        }
        Ok(self.base.get(key).cloned())
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.buffer.insert(key, Some(value));
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<()> {
        self.buffer.insert(key.to_vec(), None);
        Ok(())
    }

    fn iter_prefix<'b>(
        &'b self,
        prefix: Vec<u8>,
    ) -> Result<Box<dyn Iterator<Item = Result<RawEntry>> + 'b>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .base
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (key, value) in self.buffer.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                continue;
            }
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(Box::new(merged.into_iter().map(Ok)))
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let applied = self.buffer.len();
        for (key, value) in self.buffer {
            let path = self.driver.dir.join(key_to_filename(&key));
            match value {
                Some(value) => {
                    let text = encode_value(&value)?;
                    fs::write(&path, text).map_err(Error::from_driver)?;
                    if !self.driver.config.disable_sync {
                        let file = fs::File::open(&path).map_err(Error::from_driver)?;
                        file.sync_all().map_err(Error::from_driver)?;
                    }
                }
                None => match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(err) if io_not_found(&err) => {}
                    Err(err) => return Err(Error::from_driver(err)),
                },
            }
        }
        tracing::debug!(applied, "committed fs transaction");
        Ok(())
    }
}

/// [`DriverFactory`] for the `fs` URI scheme: `fs:///abs/path` or `fs://./relative/path`,
/// the remainder is used as-is as the data directory.
pub struct FsDriverFactory {
    config: FsDriverConfig,
}

impl FsDriverFactory {
    /// A factory using the default [`FsDriverConfig`] (sync enabled).
    pub fn new() -> Self {
        FsDriverFactory {
            config: FsDriverConfig::default(),
        }
    }

    /// A factory with an explicit [`FsDriverConfig`].
    pub fn with_config(config: FsDriverConfig) -> Self {
        FsDriverFactory { config }
    }
}

impl Default for FsDriverFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFactory for FsDriverFactory {
    fn connect(&self, rest: &str, flags: DatabaseFlags) -> Result<Box<dyn Driver>> {
        Ok(Box::new(FsDriver::open(rest, flags, self.config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buckdb::Database;
    use buckdb::DriverRegistry;

    fn registry() -> DriverRegistry {
        let mut registry = DriverRegistry::empty();
        registry.register("fs", FsDriverFactory::new());
        registry
    }

    #[test]
    fn write_then_read_only_sees_committed_value_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("fs://{}", dir.path().display());
        let registry = registry();

        {
            let db = Database::open_with_registry(&uri, DatabaseFlags::CREATE_IF_NOT_EXISTS, &registry).unwrap();
            db.update(|tx| {
                let bucket = tx.create_bucket("widgets")?;
                tx.set(&bucket, b"a", b"1".to_vec())?;
                Ok(())
            })
            .unwrap();
        }

        // Reopen against the same directory: a fresh driver must see the committed files.
        let db = Database::open_with_registry(&uri, DatabaseFlags::NONE, &registry).unwrap();
        db.view(|tx| {
            let bucket = tx.bucket("widgets")?.unwrap();
            assert_eq!(tx.get(&bucket, b"a").unwrap(), Some(b"1".to_vec()));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn missing_directory_without_create_flag_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let uri = format!("fs://{}", missing.display());
        let registry = registry();
        assert!(Database::open_with_registry(&uri, DatabaseFlags::NONE, &registry).is_err());
    }

    #[test]
    fn dropped_write_transaction_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FsDriver::open(dir.path(), DatabaseFlags::CREATE_IF_NOT_EXISTS, FsDriverConfig::default()).unwrap();
        {
            let mut tx = driver.read_write_transaction().unwrap();
            tx.set(b"k".to_vec(), b"v".to_vec()).unwrap();
            // dropped without commit
        }
        let tx = driver.read_only_transaction().unwrap();
        assert_eq!(tx.get(b"k").unwrap(), None);
    }

    #[test]
    fn read_only_transaction_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FsDriver::open(dir.path(), DatabaseFlags::CREATE_IF_NOT_EXISTS, FsDriverConfig::default()).unwrap();
        let mut tx = driver.read_only_transaction().unwrap();
        assert!(matches!(
            tx.set(b"k".to_vec(), b"v".to_vec()),
            Err(Error::ReadOnlyViolation)
        ));
    }
}
