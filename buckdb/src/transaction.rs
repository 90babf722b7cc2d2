//! The transactional handle callers actually interact with.
//!
//! Wraps a driver's [`RawTransaction`], mediates all bucket-manager calls, and layers
//! typed `get`/`set`/`remove` and ordered iteration on top of the byte-oriented
//! primitives. A transaction owns every bucket, iterator, and cursor derived from it:
//! none of those remain valid once the transaction commits or is dropped.

use crate::bucket::{self, Bucket, BucketStats};
use crate::driver::RawTransaction;
use crate::encoding::{Decode, Encode};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Active,
    Closed,
}

/// A transient, non-shareable handle bound to one [`crate::Database`].
///
/// States: *fresh* → (`reset`) → *active* → (`commit` | `rollback`) → *closed*. Every KV
/// operation requires *active*; anything else fails with [`Error::TransactionClosed`].
pub struct Transaction<'d> {
    raw: Option<Box<dyn RawTransaction + 'd>>,
    state: State,
    read_only: bool,
}

impl<'d> Transaction<'d> {
    pub(crate) fn new(raw: Box<dyn RawTransaction + 'd>) -> Self {
        let read_only = raw.is_read_only();
        Transaction {
            raw: Some(raw),
            state: State::Fresh,
            read_only,
        }
    }

    /// Re-arms a fresh transaction for use. [`crate::Database::view`] and
    /// [`crate::Database::update`] call this before invoking their callback, so callers
    /// going through the façade never need to call it themselves.
    pub fn reset(&mut self) {
        if self.state == State::Fresh {
            self.state = State::Active;
        }
    }

    /// Whether this transaction rejects writes.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn raw(&self) -> Result<&dyn RawTransaction> {
        if self.state != State::Active {
            return Err(Error::TransactionClosed);
        }
        Ok(self.raw.as_deref().expect("active transaction always holds its raw handle"))
    }

    fn raw_mut(&mut self) -> Result<&mut dyn RawTransaction> {
        if self.state != State::Active {
            return Err(Error::TransactionClosed);
        }
        Ok(self.raw.as_deref_mut().expect("active transaction always holds its raw handle"))
    }

    fn guard_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnlyViolation);
        }
        Ok(())
    }

    // -- bucket manager delegation -----------------------------------------------

    /// Creates a new bucket, failing with [`Error::BucketAlreadyExists`] if `name` is
    /// already bound.
    pub fn create_bucket(&mut self, name: &str) -> Result<Bucket> {
        self.guard_writable()?;
        let raw = self.raw_mut()?;
        bucket::create_bucket(raw, name.as_bytes())
    }

    /// Creates the bucket if absent, otherwise returns the existing handle.
    pub fn create_bucket_if_not_exists(&mut self, name: &str) -> Result<Bucket> {
        self.guard_writable()?;
        let raw = self.raw_mut()?;
        bucket::create_bucket_if_not_exists(raw, name.as_bytes())
    }

    /// Looks up a bucket by name, returning `None` if it does not exist.
    pub fn bucket(&self, name: &str) -> Result<Option<Bucket>> {
        let raw = self.raw()?;
        bucket::bucket(raw, name.as_bytes())
    }

    /// Removes a bucket and all of its entries. Fails with [`Error::BucketNotFound`] if
    /// no bucket with this name currently exists.
    pub fn remove_bucket(&mut self, name: &str) -> Result<()> {
        self.guard_writable()?;
        let handle = self
            .bucket(name)?
            .ok_or_else(|| Error::BucketNotFound(name.to_string()))?;
        let raw = self.raw_mut()?;
        bucket::remove_bucket(raw, &handle)
    }

    /// Every live bucket, in name order, lazily: nothing beyond the name→identity map is
    /// read until the returned iterator is driven, and it reflects buckets created or
    /// removed earlier in this same transaction rather than a snapshot taken at its start.
    pub fn buckets(&self) -> Result<impl Iterator<Item = Result<Bucket>> + '_> {
        let raw = self.raw()?;
        bucket::buckets(raw)
    }

    /// Entry count and identity for the bucket named `name`, derived from a linear scan.
    /// Fails with [`Error::BucketNotFound`] if no such bucket currently exists.
    pub fn bucket_stats(&self, name: &str) -> Result<BucketStats> {
        let handle = self
            .bucket(name)?
            .ok_or_else(|| Error::BucketNotFound(name.to_string()))?;
        let raw = self.raw()?;
        bucket::bucket_stats(raw, &handle)
    }

    // -- byte-oriented KV primitives ----------------------------------------------

    /// Returns the current value for `key` within `bucket`, or `None` if absent.
    pub fn get(&self, bucket: &Bucket, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let raw = self.raw()?;
        raw.get(&crate::bucket::bucket_key(bucket.identity(), key))
    }

    /// Upserts `key → value` within `bucket`.
    pub fn set(&mut self, bucket: &Bucket, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.guard_writable()?;
        let real_key = crate::bucket::bucket_key(bucket.identity(), key);
        let raw = self.raw_mut()?;
        raw.set(real_key, value)
    }

    /// Removes `key` from `bucket`, a no-op if absent.
    pub fn remove(&mut self, bucket: &Bucket, key: &[u8]) -> Result<()> {
        self.guard_writable()?;
        let real_key = crate::bucket::bucket_key(bucket.identity(), key);
        let raw = self.raw_mut()?;
        raw.remove(&real_key)
    }

    /// Ordered iteration over every `(key, value)` entry in `bucket`, with the bucket's
    /// identity prefix stripped from each key.
    pub fn iter<'a>(
        &'a self,
        bucket: &Bucket,
    ) -> Result<impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + 'a> {
        let raw = self.raw()?;
        let prefix = crate::bucket::bucket_key(bucket.identity(), &[]);
        let prefix_len = prefix.len();
        let inner = raw.iter_prefix(prefix)?;
        Ok(inner.map(move |entry| {
            let (key, value) = entry?;
            Ok((key[prefix_len..].to_vec(), value))
        }))
    }

    // -- typed conveniences ---------------------------------------------------------

    /// Typed `get`: encodes `key`, decodes the stored value as `V`. Returns `Ok(None)`
    /// both when the key is absent and propagates [`Error::DecodeError`] if the stored
    /// bytes don't decode as `V`.
    pub fn get_typed<K: Encode, V: Decode>(&self, bucket: &Bucket, key: &K) -> Result<Option<V>> {
        match self.get(bucket, &key.encode())? {
            Some(bytes) => Ok(Some(V::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Typed `set`: encodes both `key` and `value`.
    pub fn set_typed<K: Encode, V: Encode>(
        &mut self,
        bucket: &Bucket,
        key: &K,
        value: &V,
    ) -> Result<()> {
        self.set(bucket, &key.encode(), value.encode())
    }

    /// Typed `remove`: encodes `key`.
    pub fn remove_typed<K: Encode>(&mut self, bucket: &Bucket, key: &K) -> Result<()> {
        self.remove(bucket, &key.encode())
    }

    // -- lifecycle --------------------------------------------------------------

    /// Commits all buffered writes atomically and closes the transaction.
    pub fn commit(&mut self) -> Result<()> {
        if self.state != State::Active {
            return Err(Error::TransactionClosed);
        }
        let raw = self.raw.take().expect("active transaction always holds its raw handle");
        raw.commit()?;
        self.state = State::Closed;
        Ok(())
    }

    /// Rolls back (discards) the transaction. Idempotent: calling it on an already
    /// closed transaction is a no-op.
    pub fn rollback(&mut self) {
        if self.state != State::Closed {
            self.raw = None;
            self.state = State::Closed;
        }
    }
}

impl<'d> Drop for Transaction<'d> {
    fn drop(&mut self) {
        self.rollback();
    }
}
