//! `createModel` / `save` / `load` / `load-by-index` / `list` / `remove`: the operations
//! that keep a model's bucket layout consistent.

use crate::bucket::Bucket;
use crate::encoding::{hex_encode, Decode, Encode};
use crate::error::{Error, Result};
use crate::orm::model::{FieldKind, FieldValue, Model};
use crate::transaction::Transaction;

fn index_bucket_name<M: Model>(field_name: &str) -> String {
    format!("{}.{}.index", M::NAME, field_name)
}

fn row_bucket_name<M: Model>(pkey_hex: &str) -> String {
    format!("{}.{}", M::NAME, pkey_hex)
}

fn slice_bucket_name<M: Model>(pkey_hex: &str, field_name: &str) -> String {
    format!("{}.{}.{}", M::NAME, pkey_hex, field_name)
}

/// The non-empty marker value stored for each slice element. Kept as a two-byte
/// constant per the source this layout is modeled on; readers must not depend on its
/// numeric meaning, only on its presence.
const SLICE_MEMBER_MARKER: [u8; 2] = [0x00, 0x01];

/// `createModel(tx, M)`: ensures the model bucket and every index bucket exist.
pub fn create_model<M: Model>(tx: &mut Transaction<'_>) -> Result<()> {
    tx.create_bucket_if_not_exists(M::NAME)?;
    for field in M::fields() {
        if let FieldKind::Scalar { indexed: true } = field.kind {
            tx.create_bucket_if_not_exists(&index_bucket_name::<M>(field.name))?;
        }
    }
    Ok(())
}

/// `save(tx, obj)`: upserts the model-bucket entry, the row bucket's scalar fields, each
/// indexed field's index entry (retracting the previous value's entry if it changed),
/// and rebuilds every slice bucket from scratch.
pub fn save<M: Model>(tx: &mut Transaction<'_>, obj: &M) -> Result<()> {
    let pkey_bytes = obj.key().encode();
    let pkey_hex = hex_encode(&pkey_bytes);
    let row_name = row_bucket_name::<M>(&pkey_hex);

    let old = match load::<M>(tx, &obj.key()) {
        Ok(old) => Some(old),
        Err(Error::NoMatchingRecord) => None,
        Err(err) => return Err(err),
    };

    let model_bucket = tx
        .bucket(M::NAME)?
        .ok_or_else(|| Error::BucketNotFound(M::NAME.to_string()))?;
    tx.set(&model_bucket, &pkey_bytes, row_name.clone().into_bytes())?;

    let row_bucket = tx.create_bucket_if_not_exists(&row_name)?;

    for field in M::fields() {
        match field.kind {
            FieldKind::PrimaryKey => continue,
            FieldKind::Scalar { indexed } => {
                let FieldValue::Scalar(value_bytes) = (field.get)(obj) else {
                    return Err(Error::IntegrityError(format!(
                        "field {} is declared scalar but produced a slice value",
                        field.name
                    )));
                };
                tx.set(&row_bucket, field.name.as_bytes(), value_bytes.clone())?;

                if indexed {
                    let index_bucket = tx
                        .bucket(&index_bucket_name::<M>(field.name))?
                        .ok_or_else(|| Error::BucketNotFound(index_bucket_name::<M>(field.name)))?;

                    if let Some(old) = &old
                        && let FieldValue::Scalar(old_value) = (field.get)(old)
                        && old_value != value_bytes
                    {
                        tx.remove(&index_bucket, &old_value)?;
                    }
                    tx.set(&index_bucket, &value_bytes, pkey_bytes.clone())?;
                }
            }
            FieldKind::Slice => {
                let slice_name = slice_bucket_name::<M>(&pkey_hex, field.name);
                if tx.bucket(&slice_name)?.is_some() {
                    tx.remove_bucket(&slice_name)?;
                }
                let slice_bucket = tx.create_bucket_if_not_exists(&slice_name)?;

                let FieldValue::Slice(elements) = (field.get)(obj) else {
                    return Err(Error::IntegrityError(format!(
                        "field {} is declared slice but produced a scalar value",
                        field.name
                    )));
                };
                for element in elements {
                    tx.set(&slice_bucket, &element, SLICE_MEMBER_MARKER.to_vec())?;
                }
            }
        }
    }

    Ok(())
}

/// `load(tx, pkey) -> obj | NotFound`.
pub fn load<M: Model>(tx: &Transaction<'_>, pkey: &M::Key) -> Result<M> {
    load_by_bytes::<M>(tx, &pkey.encode())
}

fn load_by_bytes<M: Model>(tx: &Transaction<'_>, pkey_bytes: &[u8]) -> Result<M> {
    let model_bucket = tx
        .bucket(M::NAME)?
        .ok_or_else(|| Error::BucketNotFound(M::NAME.to_string()))?;
    let row_name_bytes = tx
        .get(&model_bucket, pkey_bytes)?
        .ok_or(Error::NoMatchingRecord)?;
    let row_name = String::from_utf8(row_name_bytes)
        .map_err(|err| Error::DecodeError(format!("row bucket name is not utf-8: {err}")))?;
    let row_bucket = tx
        .bucket(&row_name)?
        .ok_or_else(|| Error::IntegrityError(format!("missing row bucket {row_name}")))?;

    let pkey_hex = hex_encode(pkey_bytes);
    let mut obj = M::default();

    for field in M::fields() {
        match field.kind {
            FieldKind::PrimaryKey => {
                (field.set)(&mut obj, FieldValue::Scalar(pkey_bytes.to_vec()))?;
            }
            FieldKind::Scalar { .. } => {
                if let Some(value) = tx.get(&row_bucket, field.name.as_bytes())? {
                    (field.set)(&mut obj, FieldValue::Scalar(value))?;
                }
            }
            FieldKind::Slice => {
                let slice_name = slice_bucket_name::<M>(&pkey_hex, field.name);
                let elements = match tx.bucket(&slice_name)? {
                    Some(slice_bucket) => tx
                        .iter(&slice_bucket)?
                        .map(|entry| entry.map(|(key, _value)| key))
                        .collect::<Result<Vec<_>>>()?,
                    None => Vec::new(),
                };
                (field.set)(&mut obj, FieldValue::Slice(elements))?;
            }
        }
    }

    Ok(obj)
}

/// `load(tx, field, indexedValue)`: resolves the index bucket entry to a primary key,
/// then loads by primary key.
pub fn load_by_index<M: Model>(
    tx: &Transaction<'_>,
    field_name: &str,
    indexed_value: &impl Encode,
) -> Result<M> {
    let index_bucket = tx
        .bucket(&index_bucket_name::<M>(field_name))?
        .ok_or_else(|| Error::BucketNotFound(index_bucket_name::<M>(field_name)))?;
    let pkey_bytes = tx
        .get(&index_bucket, &indexed_value.encode())?
        .ok_or(Error::NoMatchingRecord)?;
    load_by_bytes::<M>(tx, &pkey_bytes)
}

/// `list(tx, M)`: iterates the model bucket in key order, loading each primary key.
/// Lazy: nothing beyond the model bucket is read until the iterator is driven, and it
/// stops at the first `Err` rather than continuing to load subsequent rows.
pub fn list<'t, M: Model + 't>(
    tx: &'t Transaction<'_>,
) -> Result<impl Iterator<Item = Result<M>> + 't> {
    let model_bucket = tx
        .bucket(M::NAME)?
        .ok_or_else(|| Error::BucketNotFound(M::NAME.to_string()))?;
    Ok(tx
        .iter(&model_bucket)?
        .scan(false, move |done, entry| {
            if *done {
                return None;
            }
            let loaded = entry.and_then(|(pkey_bytes, _row_name)| load_by_bytes::<M>(tx, &pkey_bytes));
            if loaded.is_err() {
                *done = true;
            }
            Some(loaded)
        }))
}

/// Decoded primary keys only, in bucket order; used by the autoincrement helper so it
/// doesn't pay for a full row load per key.
pub(crate) fn model_keys<'t, M: Model + 't>(
    tx: &'t Transaction<'_>,
    model_bucket: &Bucket,
) -> Result<impl Iterator<Item = Result<M::Key>> + 't> {
    Ok(tx.iter(model_bucket)?.map(|entry| {
        let (pkey_bytes, _row_name) = entry?;
        M::Key::decode(&pkey_bytes)
    }))
}

/// `remove(tx, obj)`: drops the row bucket and every slice bucket belonging to this row,
/// erases the model-bucket entry, and erases each index entry for the object's indexed
/// field values.
pub fn remove<M: Model>(tx: &mut Transaction<'_>, obj: &M) -> Result<()> {
    let pkey_bytes = obj.key().encode();
    let pkey_hex = hex_encode(&pkey_bytes);
    let row_name = row_bucket_name::<M>(&pkey_hex);

    if tx.bucket(&row_name)?.is_some() {
        tx.remove_bucket(&row_name)?;
    }

    for field in M::fields() {
        if field.kind == FieldKind::Slice {
            let slice_name = slice_bucket_name::<M>(&pkey_hex, field.name);
            if tx.bucket(&slice_name)?.is_some() {
                tx.remove_bucket(&slice_name)?;
            }
        }
    }

    if let Some(model_bucket) = tx.bucket(M::NAME)? {
        tx.remove(&model_bucket, &pkey_bytes)?;
    }

    for field in M::fields() {
        if let FieldKind::Scalar { indexed: true } = field.kind {
            let FieldValue::Scalar(value_bytes) = (field.get)(obj) else {
                continue;
            };
            if let Some(index_bucket) = tx.bucket(&index_bucket_name::<M>(field.name))? {
                tx.remove(&index_bucket, &value_bytes)?;
            }
        }
    }

    Ok(())
}
