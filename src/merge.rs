// File: src/merge.rs
use crate::error::BoxError;

/// Combines a value being inserted with whatever is already stored under the
/// same key.
///
/// `existing` is `None` the first time a key is written. The stored value is
/// only borrowed, so an `Err` leaves it untouched.
pub trait MergeFn<V> {
    fn merge(&self, existing: Option<&V>, incoming: V) -> Result<V, BoxError>;
}

impl<V, F> MergeFn<V> for F
where
    F: Fn(Option<&V>, V) -> Result<V, BoxError>,
{
    fn merge(&self, existing: Option<&V>, incoming: V) -> Result<V, BoxError> {
        self(existing, incoming)
    }
}

/// Default strategy: the incoming value overwrites the stored one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl<V> MergeFn<V> for Replace {
    fn merge(&self, _existing: Option<&V>, incoming: V) -> Result<V, BoxError> {
        Ok(incoming)
    }
}
