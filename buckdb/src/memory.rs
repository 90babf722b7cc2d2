//! The built-in `memory://` reference driver: an in-process stand-in for a
//! memory-mapped B+tree engine, backed by a sorted map guarded by a reader/writer lock.
//!
//! This is the driver used by the crate's own test suite and by callers who want
//! `buckdb`'s bucket/ORM semantics without any external storage engine. It is not meant
//! to persist across process restarts.

use std::collections::BTreeMap;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::driver::{Driver, DriverFactory, RawEntry, RawTransaction};
use crate::error::{Error, Result};
use crate::flags::DatabaseFlags;

/// In-memory [`Driver`] implementation. Read-only transactions see a cloned snapshot
/// taken at their start; a single [`parking_lot::Mutex`] serializes read-write
/// transactions, matching the "one active writer" contract every driver must uphold.
#[derive(Default)]
pub struct MemoryDriver {
    store: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    writer_lock: Mutex<()>,
}

impl MemoryDriver {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for MemoryDriver {
    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn read_only_transaction(&self) -> Result<Box<dyn RawTransaction + '_>> {
        let snapshot = self.store.read().clone();
        tracing::trace!(entries = snapshot.len(), "opened read-only memory transaction");
        Ok(Box::new(MemoryReadTransaction { snapshot }))
    }

    fn read_write_transaction(&self) -> Result<Box<dyn RawTransaction + '_>> {
        let guard = self.writer_lock.lock();
        tracing::trace!("opened read-write memory transaction");
        Ok(Box::new(MemoryWriteTransaction {
            driver: self,
            _writer_guard: guard,
            buffer: BTreeMap::new(),
        }))
    }
}

struct MemoryReadTransaction {
    snapshot: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl RawTransaction for MemoryReadTransaction {
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

struct MemoryWriteTransaction<'a> {
    driver: &'a MemoryDriver,
    _writer_guard: MutexGuard<'a, ()>,
    buffer: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> RawTransaction for MemoryWriteTransaction<'a> {
    fn is_read_only(&self) -> bool {
        false
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(buffered) = self.buffer.get(key) {
            return Ok(buffered.clone());
        }
        Ok(self.driver.store.read().get(key).cloned())
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
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = {
            let base = self.driver.store.read();
            base.range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

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
        let mut store = self.driver.store.write();
        let applied = self.buffer.len();
        for (key, value) in self.buffer {
            match value {
                Some(value) => {
                    store.insert(key, value);
                }
                None => {
                    store.remove(&key);
                }
            }
        }
        tracing::debug!(applied, "committed memory transaction");
        Ok(())
    }
}

/// [`DriverFactory`] for the `memory` URI scheme. `rest` is ignored: every `memory://...`
/// URI opens a fresh, independent store.
pub struct MemoryDriverFactory;

impl DriverFactory for MemoryDriverFactory {
    fn connect(&self, _rest: &str, _flags: DatabaseFlags) -> Result<Box<dyn Driver>> {
        Ok(Box::new(MemoryDriver::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_only_sees_committed_value() {
        let driver = MemoryDriver::new();
        {
            let mut tx = driver.read_write_transaction().unwrap();
            tx.set(b"k".to_vec(), b"v".to_vec()).unwrap();
            tx.commit().unwrap();
        }
        let tx = driver.read_only_transaction().unwrap();
        assert_eq!(tx.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn dropped_write_transaction_does_not_persist() {
        let driver = MemoryDriver::new();
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
        let driver = MemoryDriver::new();
        let mut tx = driver.read_only_transaction().unwrap();
        assert!(matches!(
            tx.set(b"k".to_vec(), b"v".to_vec()),
            Err(Error::ReadOnlyViolation)
        ));
    }
}
