//! # buckdb
//!
//! An embedded, transactional, bucket-namespaced key-value store with a thin
//! object-relational mapping layer on top.
//!
//! A [`Database`] holds a pluggable [`Driver`] (the reference [`memory::MemoryDriver`]
//! ships in-tree; production drivers bind an on-disk ordered KV engine) and exposes
//! scoped [`Database::view`]/[`Database::update`] transactions. Within a transaction,
//! [`bucket`]-namespaced entries are grouped under user-chosen names; the [`orm`] module
//! layers `#[derive(Model)]` records on top of that, each mapped onto a model bucket plus
//! per-row, per-index, and per-slice-field buckets.
//!
//! ## Layout
//!
//! - [`encoding`]: deterministic, order-preserving byte encoding of primitives.
//! - [`driver`]: the contract a storage engine implements; [`memory`] is the built-in
//!   in-process reference driver.
//! - [`bucket`]: bucket identity allocation, the free list, and the on-disk key layout.
//! - [`transaction`]: the typed, byte-oriented handle built on a driver transaction.
//! - [`orm`]: `createModel`/`save`/`load`/`load_by_index`/`list`/`remove` over
//!   `#[derive(Model)]` records.
//! - [`database`]: the `view`/`update` façade.
//! - [`registry`]: URI scheme to driver dispatch.

mod bucket;
mod database;
mod driver;
mod encoding;
mod error;
mod flags;
mod memory;
mod orm;
mod registry;
mod transaction;

pub use bucket::{Bucket, BucketStats};
pub use database::Database;
pub use driver::{Driver, DriverFactory, RawEntry, RawTransaction};
pub use encoding::{hex_encode, Decode, Encode};
pub use error::{Error, Result};
pub use flags::DatabaseFlags;
pub use memory::{MemoryDriver, MemoryDriverFactory};
pub use orm::{
    create_model, list, load, load_by_index, next_key, remove, save, save_next, FieldDescriptor,
    FieldKind, FieldValue, Incrementable, Model,
};
pub use registry::DriverRegistry;
pub use transaction::Transaction;

// `Model` the trait (type namespace) and `Model` the derive macro (macro namespace)
// don't collide: `#[derive(Model)]` resolves to the macro, `impl Model for ...` to the trait.
#[cfg(feature = "derive")]
pub use buckdb_derive::Model;
