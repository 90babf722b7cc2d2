//! URI scheme → driver dispatch.
//!
//! This is deliberately the thinnest part of the crate: construction glue for concrete
//! storage engines (an on-disk memory-mapped B+tree binding, a distributed backend,
//! whatever a consumer wants to plug in) lives outside `buckdb`. All this module does is
//! hold a `scheme -> DriverFactory` map and parse the `scheme://rest` URI grammar.

use std::collections::HashMap;

use crate::driver::{Driver, DriverFactory};
use crate::error::{Error, Result};
use crate::flags::DatabaseFlags;
use crate::memory::MemoryDriverFactory;

/// A registry mapping URI schemes to the [`DriverFactory`] that handles them.
pub struct DriverRegistry {
    factories: HashMap<String, Box<dyn DriverFactory>>,
}

impl DriverRegistry {
    /// An empty registry with no schemes registered.
    pub fn empty() -> Self {
        DriverRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry with the built-in `memory` scheme pre-registered; this is what
    /// [`crate::Database::open`] uses.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("memory", MemoryDriverFactory);
        registry
    }

    /// Registers (or replaces) the factory handling `scheme`.
    pub fn register(&mut self, scheme: impl Into<String>, factory: impl DriverFactory + 'static) {
        self.factories.insert(scheme.into(), Box::new(factory));
    }

    /// Parses `uri` as `scheme://rest` and connects via the registered factory for
    /// `scheme`. Fails with [`Error::UnsupportedDriver`] for an unregistered scheme or a
    /// URI missing `://` or with an empty remainder.
    pub fn connect(&self, uri: &str, flags: DatabaseFlags) -> Result<Box<dyn Driver>> {
        let (scheme, rest) = split_uri(uri)?;
        let factory = self
            .factories
            .get(scheme)
            .ok_or_else(|| Error::UnsupportedDriver(format!("no driver registered for scheme {scheme:?}")))?;
        factory.connect(rest, flags)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn split_uri(uri: &str) -> Result<(&str, &str)> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err(Error::UnsupportedDriver(format!("missing \"://\" in uri {uri:?}")));
    };
    if rest.is_empty() {
        return Err(Error::UnsupportedDriver(format!("empty remainder in uri {uri:?}")));
    }
    Ok((scheme, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scheme_is_unsupported() {
        let registry = DriverRegistry::with_defaults();
        assert!(matches!(
            registry.connect("lmdb://./data", DatabaseFlags::NONE),
            Err(Error::UnsupportedDriver(_))
        ));
    }

    #[test]
    fn malformed_uri_is_unsupported() {
        let registry = DriverRegistry::with_defaults();
        assert!(matches!(
            registry.connect("memory", DatabaseFlags::NONE),
            Err(Error::UnsupportedDriver(_))
        ));
        assert!(matches!(
            registry.connect("memory://", DatabaseFlags::NONE),
            Err(Error::UnsupportedDriver(_))
        ));
    }

    #[test]
    fn memory_scheme_connects() {
        let registry = DriverRegistry::with_defaults();
        assert!(registry.connect("memory://anything", DatabaseFlags::NONE).is_ok());
    }
}
