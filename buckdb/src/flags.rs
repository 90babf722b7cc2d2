//! Flags passed to [`crate::Driver::connect`] / [`crate::Database::open`].

use bitflags::bitflags;

bitflags! {
    /// Options controlling how a database is opened.
    ///
    /// Drivers may ignore flags that don't apply to them (e.g. [`DatabaseFlags::DISABLE_SYNC`]
    /// on an in-memory driver).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DatabaseFlags: u8 {
        /// No flags set.
        const NONE = 0;
        /// Create the backing store if it does not already exist.
        const CREATE_IF_NOT_EXISTS = 1;
        /// Open for reads only; writes fail with [`crate::Error::ReadOnlyViolation`].
        const READ_ONLY = 2;
        /// Hint that the driver may skip durability syncs (advisory, drivers may ignore it).
        const DISABLE_SYNC = 4;
    }
}
