//! The ORM layer: maps [`Model`] record shapes onto the bucket/index topology described
//! in the crate's top-level documentation.

mod incrementable;
mod manager;
mod model;

pub use incrementable::{next_key, save_next, Incrementable};
pub use manager::{create_model, list, load, load_by_index, remove, save};
pub use model::{FieldDescriptor, FieldKind, FieldValue, Model};
