//! # buckdb-derive
//!
//! The `#[derive(Model)]` macro: turns a plain struct into a `buckdb::Model` by generating
//! its field descriptor table, primary-key type, and `key()` accessor.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod generator;
mod schema;

use crate::generator::generate_model_impl;
use crate::schema::Schema;

/// Derives `buckdb::Model` for a struct.
///
/// # Attributes
///
/// - `#[key]`: required, exactly one field. The primary key; also becomes `Model::Key`.
/// - `#[index]`: zero or more scalar fields. Backed by a secondary index bucket.
/// - `#[slice]`: zero or more `Vec<T>` fields, stored with set semantics in a per-row
///   bucket instead of inline in the row.
///
/// Fields carrying none of these attributes are plain scalars.
///
/// ```ignore
/// #[derive(Default, buckdb::Model)]
/// struct User {
///     #[key]
///     id: u64,
///     #[index]
///     email: String,
///     #[slice]
///     roles: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(key, index, slice))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match Schema::from_derive_input(input) {
        Ok(schema) => generate_model_impl(&schema),
        Err(err) => err.to_compile_error().into(),
    }
}
