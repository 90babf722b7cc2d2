//! Parses a `#[derive(Model)]` struct into the shape [`crate::generator`] emits code from.

use syn::{Data, DeriveInput, Error, Fields, Ident, Type};

/// What role a field plays, mirroring `buckdb::FieldKind` but decided from attributes
/// rather than runtime data.
pub enum FieldRole {
    PrimaryKey,
    Scalar { indexed: bool },
    Slice,
}

pub struct ModelField {
    pub ident: Ident,
    pub ty: Type,
    pub role: FieldRole,
}

pub struct Schema {
    pub name: Ident,
    pub fields: Vec<ModelField>,
}

impl Schema {
    pub fn from_derive_input(input: DeriveInput) -> syn::Result<Schema> {
        let name = input.ident;

        let data = match input.data {
            Data::Struct(data) => data,
            _ => {
                return Err(Error::new_spanned(
                    &name,
                    "#[derive(Model)] only supports structs",
                ))
            }
        };

        let named = match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return Err(Error::new_spanned(
                    &name,
                    "#[derive(Model)] requires named fields",
                ))
            }
        };

        let mut fields = Vec::with_capacity(named.len());
        let mut primary_keys = 0;

        for field in named {
            let ident = field
                .ident
                .expect("Fields::Named guarantees an identifier");

            let is_key = field.attrs.iter().any(|attr| attr.path().is_ident("key"));
            let is_index = field.attrs.iter().any(|attr| attr.path().is_ident("index"));
            let is_slice = field.attrs.iter().any(|attr| attr.path().is_ident("slice"));

            let role = match (is_key, is_index, is_slice) {
                (true, false, false) => {
                    primary_keys += 1;
                    FieldRole::PrimaryKey
                }
                (false, true, false) => FieldRole::Scalar { indexed: true },
                (false, false, true) => FieldRole::Slice,
                (false, false, false) => FieldRole::Scalar { indexed: false },
                _ => {
                    return Err(Error::new_spanned(
                        &ident,
                        "a field may carry only one of #[key], #[index], #[slice]",
                    ))
                }
            };

            fields.push(ModelField {
                ident,
                ty: field.ty,
                role,
            });
        }

        if primary_keys != 1 {
            return Err(Error::new_spanned(
                &name,
                "exactly one field must be marked #[key]",
            ));
        }

        Ok(Schema { name, fields })
    }
}
