//! Deterministic, byte-exact, order-preserving encoding of primitive values.
//!
//! Big-endian fixed-width integers make numeric order equal lexicographic byte order
//! for unsigned types, which is what the bucket manager and ORM index buckets rely on
//! for ordered iteration. Strings are encoded as raw UTF-8 with no length prefix and no
//! NUL terminator; byte sequences are encoded as-is.

use crate::error::Error;

/// Types that can be turned into the deterministic byte representation `buckdb` stores
/// keys and values as.
pub trait Encode {
    /// Encodes `self` into its deterministic byte representation.
    fn encode(&self) -> Vec<u8>;
}

/// The inverse of [`Encode`]. Decoding a slice of the wrong length is an error, never a
/// panic or truncation.
pub trait Decode: Sized {
    /// Decodes `bytes` into `Self`, or returns [`Error::DecodeError`] if the length or
    /// contents don't match what this type expects.
    fn decode(bytes: &[u8]) -> Result<Self, Error>;
}

macro_rules! impl_uint {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self) -> Vec<u8> {
                    self.to_be_bytes().to_vec()
                }
            }

            impl Decode for $ty {
                fn decode(bytes: &[u8]) -> Result<Self, Error> {
                    let array: [u8; core::mem::size_of::<$ty>()] = bytes.try_into().map_err(|_| {
                        Error::DecodeError(format!(
                            "expected {} bytes for {}, got {}",
                            core::mem::size_of::<$ty>(),
                            stringify!($ty),
                            bytes.len()
                        ))
                    })?;
                    Ok(<$ty>::from_be_bytes(array))
                }
            }
        )*
    };
}

impl_uint!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl Encode for bool {
    fn encode(&self) -> Vec<u8> {
        vec![if *self { 1 } else { 0 }]
    }
}

impl Decode for bool {
    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        match bytes {
            [0] => Ok(false),
            [1] => Ok(true),
            other => Err(Error::DecodeError(format!(
                "expected a single 0/1 byte for bool, got {other:?}"
            ))),
        }
    }
}

impl Encode for String {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Encode for str {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Decode for String {
    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        String::from_utf8(bytes.to_vec())
            .map_err(|err| Error::DecodeError(format!("invalid utf-8 string: {err}")))
    }
}

impl Encode for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }
}

impl Decode for Vec<u8> {
    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        Ok(bytes.to_vec())
    }
}

/// Hex-encodes an already-[`Encode`]d key, as used for row- and slice-bucket names
/// (`"<model-name>.<lowercase-hex(encoded-pkey)>"`).
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_big_endian_preserves_numeric_order() {
        let mut pairs: Vec<(u32, Vec<u8>)> = (0u32..2000).map(|n| (n, n.encode())).collect();
        let numeric_order = pairs.clone();
        pairs.sort_by(|a, b| a.1.cmp(&b.1));
        assert_eq!(pairs, numeric_order);
    }

    #[test]
    fn round_trips() {
        assert_eq!(u64::decode(&42u64.encode()).unwrap(), 42u64);
        assert_eq!(bool::decode(&true.encode()).unwrap(), true);
        assert_eq!(
            String::decode(&"ada".to_string().encode()).unwrap(),
            "ada"
        );
    }

    #[test]
    fn decode_wrong_length_is_an_error() {
        assert!(u32::decode(&[1, 2]).is_err());
        assert!(bool::decode(&[2]).is_err());
    }
}
