//! The top-level handle a caller opens: wires a driver to the scoped `view`/`update`
//! transaction pattern that guarantees release on every exit path.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::flags::DatabaseFlags;
use crate::registry::DriverRegistry;
use crate::transaction::Transaction;

/// Holds a driver and exposes scoped read-only (`view`) and read-write (`update`)
/// transactions. Shareable across threads; the transactions it hands out are not (see
/// [`Transaction`]).
pub struct Database {
    driver: Box<dyn Driver>,
}

impl Database {
    /// Parses `uri` as `scheme://rest`, looks up the driver registered for `scheme` in
    /// the crate's default registry (which pre-registers the in-memory `memory` scheme),
    /// and connects.
    ///
    /// For any other scheme, build a [`DriverRegistry`] yourself and use
    /// [`Database::open_with_registry`].
    pub fn open(uri: &str, flags: DatabaseFlags) -> Result<Self> {
        Self::open_with_registry(uri, flags, &DriverRegistry::with_defaults())
    }

    /// Like [`Database::open`], but against a caller-supplied registry: the path to use
    /// for any scheme beyond the built-in `memory` one.
    pub fn open_with_registry(
        uri: &str,
        flags: DatabaseFlags,
        registry: &DriverRegistry,
    ) -> Result<Self> {
        let driver = registry.connect(uri, flags)?;
        tracing::debug!(uri, "database opened");
        Ok(Database { driver })
    }

    /// Wraps an already-constructed driver directly, bypassing URI parsing.
    pub fn from_driver(driver: Box<dyn Driver>) -> Self {
        Database { driver }
    }

    /// Runs `f` inside a read-only transaction, always releasing it afterward regardless
    /// of whether `f` returned `Ok`, `Err`, or panicked.
    pub fn view<T>(&self, f: impl FnOnce(&mut Transaction<'_>) -> Result<T>) -> Result<T> {
        let raw = self.driver.read_only_transaction()?;
        let mut tx = Transaction::new(raw);
        tx.reset();

        let outcome = catch_unwind(AssertUnwindSafe(|| f(&mut tx)));
        tx.rollback();

        match outcome {
            Ok(result) => result,
            Err(payload) => Err(Error::UncaughtException(panic_message(payload))),
        }
    }

    /// Runs `f` inside a read-write transaction. Commits if `f` returns `Ok`; rolls back
    /// if `f` returns `Err` or panics.
    pub fn update<T>(&self, f: impl FnOnce(&mut Transaction<'_>) -> Result<T>) -> Result<T> {
        let raw = self.driver.read_write_transaction()?;
        let mut tx = Transaction::new(raw);
        tx.reset();

        match catch_unwind(AssertUnwindSafe(|| f(&mut tx))) {
            Ok(Ok(value)) => {
                tx.commit()?;
                Ok(value)
            }
            Ok(Err(err)) => {
                tx.rollback();
                Err(err)
            }
            Err(payload) => {
                tx.rollback();
                Err(Error::UncaughtException(panic_message(payload)))
            }
        }
    }

    /// Releases the driver's resources. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.driver.close()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "callback panicked with a non-string payload".to_string()
    }
}
