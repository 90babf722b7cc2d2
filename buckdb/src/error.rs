//! Error kinds shared by the driver interface, bucket manager, transaction and ORM layer.

use std::fmt;

use thiserror::Error;

/// The single error type returned by every fallible `buckdb` operation.
///
/// Variants correspond to error *kinds*, not to implementation detail: a driver's own
/// error type is wrapped into [`Error::InternalDriverError`] rather than exposed directly,
/// so callers can match on this enum regardless of which driver is in use. Wrapping
/// preserves the original error as this error's `source()` (see [`Error::context`]), so a
/// `BucketNotFound`-adjacent failure raised deep in a driver can still be traced back to
/// the I/O or codec error that caused it.
#[derive(Debug, Error)]
pub enum Error {
    /// The URI scheme has no registered driver, or the URI is malformed
    /// (missing `://`, or an empty remainder after it).
    #[error("unsupported driver or malformed uri: {0}")]
    UnsupportedDriver(String),

    /// The driver could not open or create the backing store.
    #[error("failed to connect to backing store: {0}")]
    ConnectionFailed(String),

    /// A write was attempted against a read-only transaction.
    #[error("write attempted on a read-only transaction")]
    ReadOnlyViolation,

    /// An operation was attempted on a transaction that already committed or dropped.
    #[error("operation attempted on a closed transaction")]
    TransactionClosed,

    /// The named bucket does not exist.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// `createBucket` was attempted on a name that is already bound.
    #[error("bucket already exists: {0}")]
    BucketAlreadyExists(String),

    /// Raised only by typed helpers that promise presence of a key; plain `get` returns
    /// `None` instead.
    #[error("key not found")]
    KeyNotFound,

    /// An ORM lookup (by primary key or by index) found no matching row.
    #[error("no matching record")]
    NoMatchingRecord,

    /// Stored bytes could not be decoded into the requested type.
    #[error("value could not be decoded: {0}")]
    DecodeError(String),

    /// A bucket that an operation depends on is missing mid-operation, e.g. the row
    /// bucket for a key still listed in the model bucket.
    #[error("integrity error: {0}")]
    IntegrityError(String),

    /// A `view`/`update` callback returned a foreign error outside this enum.
    #[error("callback raised an uncaught error: {0}")]
    UncaughtException(String),

    /// A driver-internal failure: an I/O error, a codec error from a driver's on-disk
    /// format, or (via [`Error::internal`]) a plain invariant-violation message with no
    /// further cause. The boxed error is this variant's `source()`, reachable through
    /// [`Error::context`].
    #[error("internal driver error: {0}")]
    InternalDriverError(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Wraps an arbitrary driver error as [`Error::InternalDriverError`], preserving it as
    /// the `source()`/[`Error::context`] cause rather than flattening it to a string.
    pub fn from_driver(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::InternalDriverError(Box::new(err))
    }

    /// Builds an [`Error::InternalDriverError`] from a plain message, for internal
    /// invariant violations (e.g. bucket identity space exhaustion) that have no
    /// lower-level cause to chain.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::InternalDriverError(Box::new(Message(message.into())))
    }

    /// The underlying cause that produced this error, if one was attached when it was
    /// constructed: the I/O or codec error behind an [`Error::InternalDriverError`], for
    /// instance. `None` for every other variant, which carry no wrapped cause.
    pub fn context(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self)
    }
}

/// A bare string treated as a [`std::error::Error`], so [`Error::internal`] can populate
/// [`Error::InternalDriverError`]'s boxed cause even when there is no real lower-level
/// error object to wrap.
#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_traces_back_to_the_wrapped_cause() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "entry file missing");
        let wrapped = Error::from_driver(io_err);
        let context = wrapped.context().expect("from_driver attaches a source");
        assert_eq!(context.to_string(), "entry file missing");
    }

    #[test]
    fn internal_message_only_error_has_no_further_cause_but_is_still_a_source() {
        let err = Error::internal("bucket identity space exhausted");
        assert_eq!(err.to_string(), "internal driver error: bucket identity space exhausted");
        assert!(err.context().is_some());
        assert!(err.context().unwrap().source().is_none());
    }

    #[test]
    fn other_variants_carry_no_context() {
        let err = Error::BucketNotFound("widgets".to_string());
        assert!(err.context().is_none());
    }
}
