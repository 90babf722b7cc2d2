//! Emits the `impl Model for ...` a [`crate::schema::Schema`] describes.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

use crate::schema::{FieldRole, ModelField, Schema};

pub fn generate_model_impl(schema: &Schema) -> TokenStream {
    let name = &schema.name;
    let name_str = name.to_string();

    let primary_key = schema
        .fields
        .iter()
        .find(|field| matches!(field.role, FieldRole::PrimaryKey))
        .expect("Schema::from_derive_input guarantees exactly one #[key] field");
    let key_ty = &primary_key.ty;
    let key_ident = &primary_key.ident;

    let descriptors = schema.fields.iter().map(field_descriptor);

    let expanded = quote! {
        impl ::buckdb::Model for #name {
            const NAME: &'static str = #name_str;

            type Key = #key_ty;

            fn fields() -> &'static [::buckdb::FieldDescriptor<Self>] {
                static FIELDS: &[::buckdb::FieldDescriptor<#name>] = &[
                    #(#descriptors),*
                ];
                FIELDS
            }

            fn key(&self) -> Self::Key {
                ::core::clone::Clone::clone(&self.#key_ident)
            }
        }
    };

    TokenStream::from(expanded)
}

fn field_descriptor(field: &ModelField) -> TokenStream2 {
    let ident = &field.ident;
    let name = ident.to_string();
    let ty = &field.ty;

    match &field.role {
        FieldRole::PrimaryKey => quote! {
            ::buckdb::FieldDescriptor {
                name: #name,
                kind: ::buckdb::FieldKind::PrimaryKey,
                get: |obj| ::buckdb::FieldValue::Scalar(::buckdb::Encode::encode(&obj.#ident)),
                set: |obj, value| {
                    let ::buckdb::FieldValue::Scalar(bytes) = value else {
                        return ::core::result::Result::Err(::buckdb::Error::DecodeError(
                            ::std::format!("field {} expected a scalar value", #name),
                        ));
                    };
                    obj.#ident = <#ty as ::buckdb::Decode>::decode(&bytes)?;
                    ::core::result::Result::Ok(())
                },
            }
        },
        FieldRole::Scalar { indexed } => quote! {
            ::buckdb::FieldDescriptor {
                name: #name,
                kind: ::buckdb::FieldKind::Scalar { indexed: #indexed },
                get: |obj| ::buckdb::FieldValue::Scalar(::buckdb::Encode::encode(&obj.#ident)),
                set: |obj, value| {
                    let ::buckdb::FieldValue::Scalar(bytes) = value else {
                        return ::core::result::Result::Err(::buckdb::Error::DecodeError(
                            ::std::format!("field {} expected a scalar value", #name),
                        ));
                    };
                    obj.#ident = <#ty as ::buckdb::Decode>::decode(&bytes)?;
                    ::core::result::Result::Ok(())
                },
            }
        },
        FieldRole::Slice => {
            let element_ty = slice_element_type(ty).unwrap_or(ty);
            quote! {
                ::buckdb::FieldDescriptor {
                    name: #name,
                    kind: ::buckdb::FieldKind::Slice,
                    get: |obj| ::buckdb::FieldValue::Slice(
                        obj.#ident.iter().map(::buckdb::Encode::encode).collect()
                    ),
                    set: |obj, value| {
                        let ::buckdb::FieldValue::Slice(elements) = value else {
                            return ::core::result::Result::Err(::buckdb::Error::DecodeError(
                                ::std::format!("field {} expected a slice value", #name),
                            ));
                        };
                        obj.#ident = elements
                            .iter()
                            .map(|bytes| <#element_ty as ::buckdb::Decode>::decode(bytes))
                            .collect::<::buckdb::Result<::std::vec::Vec<#element_ty>>>()?;
                        ::core::result::Result::Ok(())
                    },
                }
            }
        }
    }
}

/// `Vec<T>` -> `T`, for a slice field's storage type. Falls back to the declared field
/// type itself if it isn't a `Vec<...>` (the generated code will then simply fail to
/// compile against a type that doesn't implement `Encode`/`Decode`, which is the right
/// failure mode for a field misdeclared as `#[slice]`).
fn slice_element_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Vec" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}
