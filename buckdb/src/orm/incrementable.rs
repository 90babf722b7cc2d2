//! Autoincrement sugar for primary keys, layered on top of `save`/`load` rather than
//! replacing them: callers that want an explicit key keep using `save` exactly as
//! specified; callers whose key type implements [`Incrementable`] may ask for the next
//! unused one instead of tracking it themselves.

use crate::orm::manager;
use crate::orm::model::Model;
use crate::error::Result;
use crate::transaction::Transaction;

/// A primary key type that can produce its first value and its own successor.
pub trait Incrementable: Sized {
    /// The first key a fresh model bucket hands out.
    fn first() -> Self;
    /// The key that immediately follows `self`.
    fn successor(&self) -> Self;
}

macro_rules! impl_incrementable_uint {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Incrementable for $ty {
                fn first() -> Self {
                    1
                }

                fn successor(&self) -> Self {
                    self.saturating_add(1)
                }
            }
        )*
    };
}

impl_incrementable_uint!(u8, u16, u32, u64, u128);

/// The smallest key not yet used by any saved record of `M`, i.e.
/// `max(existing keys).successor()`, or [`Incrementable::first`] if the model bucket is
/// empty or does not exist yet.
pub fn next_key<M: Model>(tx: &Transaction<'_>) -> Result<M::Key>
where
    M::Key: Incrementable,
{
    let Some(model_bucket) = tx.bucket(M::NAME)? else {
        return Ok(M::Key::first());
    };

    let mut max: Option<M::Key> = None;
    for entry in manager::model_keys::<M>(tx, &model_bucket)? {
        let key = entry?;
        max = Some(match max {
            Some(current) if current >= key => current,
            _ => key,
        });
    }

    Ok(match max {
        Some(key) => key.successor(),
        None => M::Key::first(),
    })
}

/// Builds a record from the next unused key and saves it in one step, returning the key
/// that was assigned.
pub fn save_next<M: Model>(
    tx: &mut Transaction<'_>,
    build: impl FnOnce(M::Key) -> M,
) -> Result<M::Key>
where
    M::Key: Incrementable,
{
    let key = next_key::<M>(tx)?;
    let record = build(key.clone());
    manager::save(tx, &record)?;
    Ok(key)
}
