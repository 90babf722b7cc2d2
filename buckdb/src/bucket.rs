//! Bucket identity allocation, the free list, and the on-disk key layout.
//!
//! A bucket is a namespace within a transaction's raw keyspace: every user-visible entry
//! of bucket `b` with identity `I` is stored under the real key
//! `big-endian(I) || userKey`. This module owns two reserved, driver-internal buckets
//! that never reach user code directly:
//!
//! - the name→identity map (`$meta:name->id`), and
//! - the identity free list (`$meta:freelist`),
//!
//! plus a small counter entry tracking the highest identity ever handed out, so a fresh
//! allocation (when the free list is empty) is `maxAllocatedIdentity + 1`.

use crate::encoding::{Decode, Encode};
use crate::error::{Error, Result};
use crate::driver::RawTransaction;

/// Bucket names beginning with this prefix are reserved for internal bookkeeping;
/// `createBucket` on such a name fails as though the name were already bound.
pub const RESERVED_PREFIX: &[u8] = b"$meta:";

const NAME_TO_ID_IDENTITY: u32 = u32::MAX;
const FREELIST_IDENTITY: u32 = u32::MAX - 1;
const COUNTER_IDENTITY: u32 = u32::MAX - 2;
const COUNTER_KEY: &[u8] = &[0];

/// A handle to a bucket within the transaction that produced it: a stable name and the
/// numeric identity backing its on-disk key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    name: Vec<u8>,
    identity: u32,
}

impl Bucket {
    fn new(name: impl Into<Vec<u8>>, identity: u32) -> Self {
        Bucket {
            name: name.into(),
            identity,
        }
    }

    /// The bucket's user-chosen name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// The bucket's name, as a `str`, when it happens to be valid UTF-8 (true of every
    /// bucket the ORM layer creates).
    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.name).ok()
    }

    /// The stable, non-zero numeric identity backing this bucket's key prefix.
    pub fn identity(&self) -> u32 {
        self.identity
    }
}

/// Read-only diagnostics about a bucket's contents, computed by a linear scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketStats {
    /// The bucket's numeric identity.
    pub identity: u32,
    /// The number of live entries currently stored in the bucket.
    pub len: usize,
}

/// Builds the real on-disk key for `user_key` within the bucket identified by `identity`.
pub(crate) fn bucket_key(identity: u32, user_key: &[u8]) -> Vec<u8> {
    let mut key = identity.encode();
    key.extend_from_slice(user_key);
    key
}

fn identity_prefix(identity: u32) -> Vec<u8> {
    identity.encode()
}

fn is_reserved(name: &[u8]) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

fn lookup(tx: &dyn RawTransaction, name: &[u8]) -> Result<Option<u32>> {
    let key = bucket_key(NAME_TO_ID_IDENTITY, name);
    match tx.get(&key)? {
        Some(bytes) => Ok(Some(u32::decode(&bytes)?)),
        None => Ok(None),
    }
}

fn allocate_identity(tx: &mut dyn RawTransaction) -> Result<u32> {
    let freelist_prefix = identity_prefix(FREELIST_IDENTITY);
    let mut candidate = None;
    {
        let mut iter = tx.iter_prefix(freelist_prefix.clone())?;
        if let Some(entry) = iter.next() {
            let (key, _) = entry?;
            candidate = Some(key);
        }
    }
    if let Some(key) = candidate {
        let identity = u32::decode(&key[freelist_prefix.len()..])?;
        tx.remove(&key)?;
        tracing::trace!(identity, "reused bucket identity from free list");
        return Ok(identity);
    }

    let counter_key = bucket_key(COUNTER_IDENTITY, COUNTER_KEY);
    let next = match tx.get(&counter_key)? {
        Some(bytes) => u32::decode(&bytes)?
            .checked_add(1)
            .ok_or_else(|| Error::internal("bucket identity space exhausted"))?,
        None => 1,
    };
    tx.set(counter_key, next.encode())?;
    tracing::trace!(identity = next, "allocated fresh bucket identity");
    Ok(next)
}

/// `createBucket(name)`: fails with [`Error::BucketAlreadyExists`] if `name` is already
/// bound (including when it collides with the reserved `$meta:` prefix).
pub fn create_bucket(tx: &mut dyn RawTransaction, name: &[u8]) -> Result<Bucket> {
    if is_reserved(name) || lookup(tx, name)?.is_some() {
        return Err(Error::BucketAlreadyExists(String::from_utf8_lossy(name).into_owned()));
    }
    let identity = allocate_identity(tx)?;
    let key = bucket_key(NAME_TO_ID_IDENTITY, name);
    tx.set(key, identity.encode())?;
    Ok(Bucket::new(name, identity))
}

/// `createBucketIfNotExists(name)`: looks the name up first, creating it only if absent.
pub fn create_bucket_if_not_exists(tx: &mut dyn RawTransaction, name: &[u8]) -> Result<Bucket> {
    if let Some(identity) = lookup(tx, name)? {
        return Ok(Bucket::new(name, identity));
    }
    create_bucket(tx, name)
}

/// `bucket(name)`: returns the bucket's handle, or `None` if no such bucket exists.
pub fn bucket(tx: &dyn RawTransaction, name: &[u8]) -> Result<Option<Bucket>> {
    Ok(lookup(tx, name)?.map(|identity| Bucket::new(name, identity)))
}

/// `removeBucket(b)`: erases every entry under `b`'s identity prefix, erases the name
/// mapping, and releases the identity back to the free list.
pub fn remove_bucket(tx: &mut dyn RawTransaction, bucket: &Bucket) -> Result<()> {
    let prefix = identity_prefix(bucket.identity);
    let keys: Vec<Vec<u8>> = {
        let iter = tx.iter_prefix(prefix)?;
        iter.map(|entry| entry.map(|(key, _)| key)).collect::<Result<_>>()?
    };
    for key in keys {
        tx.remove(&key)?;
    }

    let name_key = bucket_key(NAME_TO_ID_IDENTITY, &bucket.name);
    tx.remove(&name_key)?;

    let freelist_key = bucket_key(FREELIST_IDENTITY, &bucket.identity.encode());
    tx.set(freelist_key, Vec::new())?;
    tracing::trace!(identity = bucket.identity, "removed bucket, released identity");
    Ok(())
}

/// `buckets()`: every live bucket in name order, lazily.
///
/// Backed by a call-time scan of the name→identity map, so it reflects any buckets
/// created or removed earlier within the same transaction; this is not a snapshot taken
/// at transaction start. Nothing beyond the name→identity map is read until the returned
/// iterator is driven.
pub fn buckets<'a>(tx: &'a dyn RawTransaction) -> Result<impl Iterator<Item = Result<Bucket>> + 'a> {
    let prefix = identity_prefix(NAME_TO_ID_IDENTITY);
    let prefix_len = prefix.len();
    let entries = tx.iter_prefix(prefix)?;
    Ok(entries.map(move |entry| {
        let (key, value) = entry?;
        let name = key[prefix_len..].to_vec();
        let identity = u32::decode(&value)?;
        Ok(Bucket::new(name, identity))
    }))
}

/// Read-only diagnostics for a bucket: its entry count, derived from a linear scan.
pub fn bucket_stats(tx: &dyn RawTransaction, bucket: &Bucket) -> Result<BucketStats> {
    let prefix = identity_prefix(bucket.identity);
    let len = tx.iter_prefix(prefix)?.count();
    Ok(BucketStats {
        identity: bucket.identity,
        len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDriver;
    use crate::driver::Driver;

    #[test]
    fn identities_are_reused_smallest_first() {
        let driver = MemoryDriver::new();
        let mut tx = driver.read_write_transaction().unwrap();

        let mut handles = Vec::new();
        for n in 1..=5 {
            handles.push(create_bucket(&mut *tx, format!("{n}").as_bytes()).unwrap());
        }
        assert_eq!(handles.iter().map(Bucket::identity).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        remove_bucket(&mut *tx, &handles[2]).unwrap();
        let reused = create_bucket(&mut *tx, b"20").unwrap();
        assert_eq!(reused.identity(), 3);
    }

    #[test]
    fn duplicate_name_is_an_error() {
        let driver = MemoryDriver::new();
        let mut tx = driver.read_write_transaction().unwrap();
        create_bucket(&mut *tx, b"a").unwrap();
        assert!(matches!(
            create_bucket(&mut *tx, b"a"),
            Err(Error::BucketAlreadyExists(_))
        ));
    }

    #[test]
    fn reserved_prefix_is_rejected() {
        let driver = MemoryDriver::new();
        let mut tx = driver.read_write_transaction().unwrap();
        assert!(matches!(
            create_bucket(&mut *tx, b"$meta:whatever"),
            Err(Error::BucketAlreadyExists(_))
        ));
    }

    #[test]
    fn removed_bucket_is_absent_from_listing() {
        let driver = MemoryDriver::new();
        let mut tx = driver.read_write_transaction().unwrap();
        let a = create_bucket(&mut *tx, b"a").unwrap();
        create_bucket(&mut *tx, b"b").unwrap();
        remove_bucket(&mut *tx, &a).unwrap();

        assert!(bucket(&*tx, b"a").unwrap().is_none());
        let names: Vec<_> = buckets(&*tx)
            .unwrap()
            .map(|b| b.unwrap().name().to_vec())
            .collect();
        assert_eq!(names, vec![b"b".to_vec()]);
    }

    #[test]
    fn buckets_are_listed_in_name_order() {
        let driver = MemoryDriver::new();
        let mut tx = driver.read_write_transaction().unwrap();
        for name in ["charlie", "alpha", "bravo"] {
            create_bucket(&mut *tx, name.as_bytes()).unwrap();
        }
        let names: Vec<_> = buckets(&*tx)
            .unwrap()
            .map(|b| b.unwrap().name_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    }
}
