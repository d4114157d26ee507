//! Entry processors backing the map-style cache operations.
//!
//! Every processor here reads or writes exactly one entry. Caller-supplied
//! functions are held behind an `Arc` so a processor can be cloned for each
//! activation of a stream and shipped to the cache; when such a function
//! fails, the processor returns before touching the entry.

use crate::entry::{Expiry, MutableEntry};
use crate::processor::EntryProcessor;
use crate::{CacheKey, CacheValue};
use common::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Reads the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Get;

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for Get {
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        Ok(entry.value().cloned())
    }
}

/// Reads the current value, reporting absence as `Some(None)` so that the
/// caller always gets exactly one result.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOrDefault;

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for GetOrDefault {
    type Output = Option<V>;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<Option<V>>> {
        Ok(Some(entry.value().cloned()))
    }
}

/// Does nothing; used to enumerate keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nop;

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for Nop {
    type Output = ();

    fn process(&self, _entry: &mut MutableEntry<K, V>) -> Result<Option<()>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckPresent;

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for CheckPresent {
    type Output = bool;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<bool>> {
        Ok(Some(entry.is_present()))
    }
}

#[derive(Debug, Clone)]
pub struct Put<V> {
    value:  V,
    expiry: Expiry,
}

impl<V> Put<V> {
    pub fn new(value: V, expiry: Expiry) -> Self {
        Self { value, expiry }
    }
}

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for Put<V> {
    type Output = ();

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<()>> {
        entry.set_value_with_expiry(self.value.clone(), self.expiry);
        Ok(None)
    }
}

/// Writes the value mapped to the processed entry's key, if any.
pub struct PutAll<K, V> {
    entries: Arc<HashMap<K, V>>,
}

impl<K, V> Clone for PutAll<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> PutAll<K, V> {
    pub fn new(entries: HashMap<K, V>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for PutAll<K, V> {
    type Output = ();

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<()>> {
        if let Some(value) = self.entries.get(entry.key()) {
            entry.set_value_with_expiry(value.clone(), Expiry::Default);
        }
        Ok(None)
    }
}

/// Removes the entry and reports what it held.
#[derive(Debug, Clone, Copy, Default)]
pub struct Remove;

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for Remove {
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        Ok(entry.remove())
    }
}

/// Removes the entry without reporting anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveBlind;

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for RemoveBlind {
    type Output = ();

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<()>> {
        entry.remove();
        Ok(None)
    }
}

/// Removes the entry only while it holds `expected`.
#[derive(Debug, Clone)]
pub struct RemoveValue<V> {
    expected: V,
}

impl<V> RemoveValue<V> {
    pub fn new(expected: V) -> Self {
        Self { expected }
    }
}

impl<K: CacheKey, V: CacheValue + PartialEq> EntryProcessor<K, V> for RemoveValue<V> {
    type Output = bool;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<bool>> {
        if entry.value() == Some(&self.expected) {
            entry.remove();
            return Ok(Some(true));
        }
        Ok(Some(false))
    }
}

/// Writes only when nothing is there; reports the value that blocked it.
#[derive(Debug, Clone)]
pub struct PutIfAbsent<V> {
    value: V,
}

impl<V> PutIfAbsent<V> {
    pub fn new(value: V) -> Self {
        Self { value }
    }
}

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for PutIfAbsent<V> {
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        if let Some(existing) = entry.value() {
            return Ok(Some(existing.clone()));
        }
        entry.set_value(self.value.clone());
        Ok(None)
    }
}

/// Overwrites a present entry and reports the prior value.
#[derive(Debug, Clone)]
pub struct Replace<V> {
    value: V,
}

impl<V> Replace<V> {
    pub fn new(value: V) -> Self {
        Self { value }
    }
}

impl<K: CacheKey, V: CacheValue> EntryProcessor<K, V> for Replace<V> {
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        if !entry.is_present() {
            return Ok(None);
        }
        Ok(entry.set_value(self.value.clone()))
    }
}

/// Compare-and-set.
#[derive(Debug, Clone)]
pub struct ReplaceValue<V> {
    expected: V,
    value:    V,
}

impl<V> ReplaceValue<V> {
    pub fn new(expected: V, value: V) -> Self {
        Self { expected, value }
    }
}

impl<K: CacheKey, V: CacheValue + PartialEq> EntryProcessor<K, V> for ReplaceValue<V> {
    type Output = bool;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<bool>> {
        if entry.value() != Some(&self.expected) {
            return Ok(Some(false));
        }
        entry.set_value(self.value.clone());
        Ok(Some(true))
    }
}

pub struct ComputeIfAbsent<F> {
    function: Arc<F>,
}

impl<F> Clone for ComputeIfAbsent<F> {
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
        }
    }
}

impl<F> ComputeIfAbsent<F> {
    pub fn new(function: F) -> Self {
        Self {
            function: Arc::new(function),
        }
    }
}

impl<K, V, F> EntryProcessor<K, V> for ComputeIfAbsent<F>
where
    K: CacheKey,
    V: CacheValue,
    F: Fn(&K) -> Result<Option<V>> + Send + Sync + 'static,
{
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        if let Some(existing) = entry.value() {
            return Ok(Some(existing.clone()));
        }
        let computed = (self.function)(entry.key())?;
        if let Some(value) = &computed {
            entry.set_value(value.clone());
        }
        Ok(computed)
    }
}

pub struct ComputeIfPresent<F> {
    function: Arc<F>,
}

impl<F> Clone for ComputeIfPresent<F> {
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
        }
    }
}

impl<F> ComputeIfPresent<F> {
    pub fn new(function: F) -> Self {
        Self {
            function: Arc::new(function),
        }
    }
}

impl<K, V, F> EntryProcessor<K, V> for ComputeIfPresent<F>
where
    K: CacheKey,
    V: CacheValue,
    F: Fn(&K, &V) -> Result<Option<V>> + Send + Sync + 'static,
{
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        let Some(current) = entry.value() else {
            return Ok(None);
        };
        let computed = (self.function)(entry.key(), current)?;
        store_or_remove(entry, computed)
    }
}

pub struct Compute<F> {
    function: Arc<F>,
}

impl<F> Clone for Compute<F> {
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
        }
    }
}

impl<F> Compute<F> {
    pub fn new(function: F) -> Self {
        Self {
            function: Arc::new(function),
        }
    }
}

impl<K, V, F> EntryProcessor<K, V> for Compute<F>
where
    K: CacheKey,
    V: CacheValue,
    F: Fn(&K, Option<&V>) -> Result<Option<V>> + Send + Sync + 'static,
{
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        let computed = (self.function)(entry.key(), entry.value())?;
        store_or_remove(entry, computed)
    }
}

pub struct Merge<V, F> {
    value:    V,
    function: Arc<F>,
}

impl<V: Clone, F> Clone for Merge<V, F> {
    fn clone(&self) -> Self {
        Self {
            value:    self.value.clone(),
            function: self.function.clone(),
        }
    }
}

impl<V, F> Merge<V, F> {
    pub fn new(value: V, function: F) -> Self {
        Self {
            value,
            function: Arc::new(function),
        }
    }
}

impl<K, V, F> EntryProcessor<K, V> for Merge<V, F>
where
    K: CacheKey,
    V: CacheValue,
    F: Fn(&V, &V) -> Result<Option<V>> + Send + Sync + 'static,
{
    type Output = V;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<V>> {
        let merged = match entry.value() {
            Some(current) => (self.function)(current, &self.value)?,
            None => Some(self.value.clone()),
        };
        store_or_remove(entry, merged)
    }
}

/// Rewrites every present entry it is applied to.
pub struct ReplaceWith<F> {
    function: Arc<F>,
}

impl<F> Clone for ReplaceWith<F> {
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
        }
    }
}

impl<F> ReplaceWith<F> {
    pub fn new(function: F) -> Self {
        Self {
            function: Arc::new(function),
        }
    }
}

impl<K, V, F> EntryProcessor<K, V> for ReplaceWith<F>
where
    K: CacheKey,
    V: CacheValue,
    F: Fn(&K, &V) -> Result<V> + Send + Sync + 'static,
{
    type Output = ();

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<()>> {
        if let Some(current) = entry.value() {
            let replacement = (self.function)(entry.key(), current)?;
            entry.set_value(replacement);
        }
        Ok(None)
    }
}

fn store_or_remove<K, V: Clone>(
    entry: &mut MutableEntry<K, V>,
    computed: Option<V>,
) -> Result<Option<V>> {
    match computed {
        Some(value) => {
            entry.set_value(value.clone());
            Ok(Some(value))
        }
        None => {
            entry.remove();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Mutation;
    use common::error::Error;

    fn run<P>(processor: &P, value: Option<i32>) -> (Result<Option<P::Output>>, Mutation<i32>)
    where
        P: EntryProcessor<&'static str, i32>,
    {
        let mut entry = MutableEntry::new("k", value);
        let out = processor.process(&mut entry);
        (out, entry.into_mutation())
    }

    #[test]
    fn test_get_and_check_present() {
        assert_eq!(run(&Get, Some(4)).0.unwrap(), Some(4));
        assert_eq!(run(&Get, None).0.unwrap(), None);
        assert_eq!(run(&CheckPresent, None).0.unwrap(), Some(false));
        assert_eq!(run(&GetOrDefault, None).0.unwrap(), Some(None));
    }

    #[test]
    fn test_put_if_absent() {
        let (out, mutation) = run(&PutIfAbsent::new(9), Some(1));
        assert_eq!(out.unwrap(), Some(1));
        assert_eq!(mutation, Mutation::Unchanged);

        let (out, mutation) = run(&PutIfAbsent::new(9), None);
        assert_eq!(out.unwrap(), None);
        assert_eq!(
            mutation,
            Mutation::Set {
                value:  9,
                expiry: None,
            }
        );
    }

    #[test]
    fn test_replace_only_when_present() {
        let (out, mutation) = run(&Replace::new(2), None);
        assert_eq!(out.unwrap(), None);
        assert_eq!(mutation, Mutation::Unchanged);

        let (out, _) = run(&Replace::new(2), Some(1));
        assert_eq!(out.unwrap(), Some(1));
    }

    #[test]
    fn test_replace_value_compares() {
        let (out, mutation) = run(&ReplaceValue::new(1, 2), Some(3));
        assert_eq!(out.unwrap(), Some(false));
        assert_eq!(mutation, Mutation::Unchanged);

        let (out, mutation) = run(&ReplaceValue::new(3, 2), Some(3));
        assert_eq!(out.unwrap(), Some(true));
        assert!(matches!(mutation, Mutation::Set { value: 2, .. }));
    }

    #[test]
    fn test_remove_value_compares() {
        let (out, mutation) = run(&RemoveValue::new(1), Some(3));
        assert_eq!(out.unwrap(), Some(false));
        assert_eq!(mutation, Mutation::Unchanged);

        let (out, mutation) = run(&RemoveValue::new(3), Some(3));
        assert_eq!(out.unwrap(), Some(true));
        assert_eq!(mutation, Mutation::Removed);
    }

    #[test]
    fn test_compute_if_absent_skips_function_when_present() {
        let processor = ComputeIfAbsent::new(|_: &&str| -> Result<Option<i32>> {
            panic!("must not be called")
        });
        let (out, mutation) = run(&processor, Some(5));
        assert_eq!(out.unwrap(), Some(5));
        assert_eq!(mutation, Mutation::Unchanged);
    }

    #[test]
    fn test_compute_if_present_none_removes() {
        let processor = ComputeIfPresent::new(|_: &&str, _: &i32| -> Result<Option<i32>> { Ok(None) });
        let (out, mutation) = run(&processor, Some(5));
        assert_eq!(out.unwrap(), None);
        assert_eq!(mutation, Mutation::Removed);
    }

    #[test]
    fn test_compute_failure_leaves_entry() {
        let processor = Compute::new(|_: &&str, _: Option<&i32>| -> Result<Option<i32>> {
            Err(Error::function("remapping failed"))
        });
        let (out, mutation) = run(&processor, Some(5));
        assert!(matches!(out, Err(Error::Function(_))));
        assert_eq!(mutation, Mutation::Unchanged);
    }

    #[test]
    fn test_merge() {
        let sum = Merge::new(10, |a: &i32, b: &i32| -> Result<Option<i32>> { Ok(Some(a + b)) });
        assert_eq!(run(&sum, None).0.unwrap(), Some(10));
        assert_eq!(run(&sum, Some(5)).0.unwrap(), Some(15));

        let drop = Merge::new(10, |_: &i32, _: &i32| -> Result<Option<i32>> { Ok(None) });
        let (out, mutation) = run(&drop, Some(5));
        assert_eq!(out.unwrap(), None);
        assert_eq!(mutation, Mutation::Removed);
    }

    #[test]
    fn test_put_all_only_writes_own_key() {
        let processor = PutAll::new(HashMap::from([("other", 1)]));
        let (_, mutation) = run(&processor, None);
        assert_eq!(mutation, Mutation::Unchanged);

        let processor = PutAll::new(HashMap::from([("k", 1)]));
        let (_, mutation) = run(&processor, None);
        assert!(matches!(mutation, Mutation::Set { value: 1, .. }));
    }

    #[test]
    fn test_replace_with_ignores_absent() {
        let processor = ReplaceWith::new(|_: &&str, v: &i32| -> Result<i32> { Ok(v * 2) });
        assert_eq!(run(&processor, None).1, Mutation::Unchanged);
        assert!(matches!(run(&processor, Some(4)).1, Mutation::Set { value: 8, .. }));
    }
}
