//! The compile-time field descriptor contract a `#[derive(Model)]` struct implements.
//!
//! Rust has no runtime struct reflection, so the ORM layer's "descriptor of each field
//! (name, encoder, decoder, indexed?, slice-element type, primary-key?)" is instead a
//! `&'static [FieldDescriptor<Self>]` that `buckdb-derive` generates at compile time: one
//! entry per field, each carrying a pair of function pointers that close over the actual
//! field access and its concrete [`crate::Encode`]/[`crate::Decode`] implementation.

use crate::encoding::{Decode, Encode};
use crate::error::Result;

/// What role a field plays in the bucket layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The model's single primary key. Stored in the model bucket, not in the row
    /// bucket.
    PrimaryKey,
    /// A plain scalar field, optionally backed by a secondary index bucket.
    Scalar {
        /// Whether this field has an index bucket (`<Model>.<Field>.index`).
        indexed: bool,
    },
    /// An ordered multi-valued field, backed by a per-row slice bucket with
    /// set semantics.
    Slice,
}

/// A field's already-encoded value (scalar) or already-encoded element list (slice), as
/// produced/consumed by a [`FieldDescriptor`]'s function pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A single encoded scalar value.
    Scalar(Vec<u8>),
    /// An ordered list of encoded slice elements.
    Slice(Vec<Vec<u8>>),
}

/// One field of a [`Model`], generated by `#[derive(Model)]`.
pub struct FieldDescriptor<M> {
    /// The field's name, also used as its row-bucket key and index/slice bucket-name
    /// component.
    pub name: &'static str,
    /// The field's role: primary key, (optionally indexed) scalar, or slice.
    pub kind: FieldKind,
    /// Reads and encodes the field out of an instance of `M`.
    pub get: fn(&M) -> FieldValue,
    /// Decodes and writes the field into an instance of `M`. Errors propagate as
    /// [`crate::Error::DecodeError`].
    pub set: fn(&mut M, FieldValue) -> Result<()>,
}

/// A record type whose shape the ORM layer maps onto a bucket/index topology: one model
/// bucket, one row bucket per record, one index bucket per indexed field, and one slice
/// bucket per (record, slice field).
pub trait Model: Default + Sized {
    /// This model's name; the model bucket's name and every row/index/slice bucket's
    /// name prefix.
    const NAME: &'static str;

    /// The primary key's Rust type.
    type Key: Encode + Decode + Default + Ord + Clone;

    /// This model's field descriptors, in declaration order, including the primary key.
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Returns this instance's primary key.
    fn key(&self) -> Self::Key;
}
