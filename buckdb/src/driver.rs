//! The pluggable storage-engine contract.
//!
//! A driver is an ordered, durable (or in-memory) key-value engine that can hand out
//! read-only and read-write transactions over raw bytes. Everything above this layer,
//! the bucket manager, the typed [`crate::Transaction`] wrapper, and the ORM, is driver
//! agnostic and built entirely on [`Driver`] and [`RawTransaction`].
//!
//! The reference driver shipped in [`crate::memory`] is an in-process B+tree stand-in
//! (a sorted map guarded by a reader/writer lock); concrete bindings to an on-disk
//! memory-mapped engine are a separate crate's concern (see [`crate::registry`]).

use crate::error::Result;
use crate::flags::DatabaseFlags;

/// A single raw key-value entry as returned by [`RawTransaction::iter_prefix`].
pub type RawEntry = (Vec<u8>, Vec<u8>);

/// A raw, byte-oriented transaction against a driver's backing store.
///
/// Every method operates on already bucket-prefixed keys (see the bucket manager's key
/// layout): the driver itself has no notion of buckets, only of an ordered byte keyspace.
///
/// Implementations must roll back all buffered writes if the transaction is dropped
/// without a call to [`RawTransaction::commit`].
pub trait RawTransaction {
    /// Whether this transaction rejects writes.
    fn is_read_only(&self) -> bool;

    /// Returns the current value for `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Upserts `key → value`. Callers are expected to have already checked
    /// [`RawTransaction::is_read_only`]; drivers may double-check and return
    /// [`crate::Error::ReadOnlyViolation`] themselves.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Removes `key` if present; a no-op, not an error, if absent.
    fn remove(&mut self, key: &[u8]) -> Result<()>;

    /// Ordered iteration (lexicographic byte order) over every key that starts with
    /// `prefix`, stopping at the first key that does not match.
    fn iter_prefix<'a>(
        &'a self,
        prefix: Vec<u8>,
    ) -> Result<Box<dyn Iterator<Item = Result<RawEntry>> + 'a>>;

    /// Commits all buffered writes atomically. Consumes the transaction: there is no
    /// valid operation after this but re-opening a new one.
    fn commit(self: Box<Self>) -> Result<()>;
}

/// A storage engine: opens/closes the backing store and hands out transactions.
///
/// Drivers must support arbitrarily many concurrent read-only transactions, each with a
/// stable snapshot, and must serialize read-write transactions (only one active at a
/// time).
pub trait Driver: Send + Sync {
    /// Releases all resources held by this driver. Idempotent.
    fn close(&self) -> Result<()>;

    /// Starts a read-only transaction with a snapshot consistent with this call.
    fn read_only_transaction(&self) -> Result<Box<dyn RawTransaction + '_>>;

    /// Starts a read-write transaction. Blocks (or otherwise serializes) if another
    /// read-write transaction is already active.
    fn read_write_transaction(&self) -> Result<Box<dyn RawTransaction + '_>>;
}

/// Opens or creates a driver's backing store from the URI remainder (everything after
/// `scheme://`) and a set of [`DatabaseFlags`].
///
/// Implemented per driver and registered under a URI scheme with a
/// [`crate::registry::DriverRegistry`]; see [`crate::Database::open`].
pub trait DriverFactory: Send + Sync {
    /// Connects to (or creates) the backing store named by `rest`.
    fn connect(&self, rest: &str, flags: DatabaseFlags) -> Result<Box<dyn Driver>>;
}
