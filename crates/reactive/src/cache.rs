use crate::bridge;
use crate::descriptor::{Aggregation, BatchInvocation, Invocation};
use crate::stream::ResultStream;
use crate::translate;
use common::error::Result;
use std::collections::HashMap;
use std::marker::PhantomData;
use storage::{
    AsyncCache, CacheKey, CacheValue, Entry, EntryAggregator, EntryProcessor, Expiry, Filter,
    Scope,
};

/// A map-like view of an asynchronous cache in which every operation returns
/// a cold [`ResultStream`].
///
/// Only [`invoke`](Self::invoke), the `invoke_all` family and the `aggregate`
/// family talk to the cache; everything else is composed from them.
/// Operations that have nothing to report return `ResultStream<()>`, which
/// emits no items and only signals completion or failure.
pub struct RxCache<K, V, C> {
    cache:   C,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, C: Clone> Clone for RxCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            cache:   self.cache.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, C> RxCache<K, V, C>
where
    K: CacheKey,
    V: CacheValue,
    C: AsyncCache<K, V>,
{
    pub fn rx(cache: C) -> Self {
        Self {
            cache,
            _marker: PhantomData,
        }
    }

    pub fn inner(&self) -> &C {
        &self.cache
    }

    // ---- primitives ----

    pub fn invoke<P>(&self, key: K, processor: P) -> ResultStream<P::Output>
    where
        P: EntryProcessor<K, V>,
    {
        self.dispatch(Invocation::new(key, processor))
    }

    pub fn invoke_all<P>(
        &self,
        keys: impl IntoIterator<Item = K>,
        processor: P,
    ) -> ResultStream<Entry<K, P::Output>>
    where
        P: EntryProcessor<K, V>,
    {
        self.dispatch_all(BatchInvocation::new(Scope::keys(keys), processor))
    }

    pub fn invoke_all_matching<P>(
        &self,
        filter: Filter<K, V>,
        processor: P,
    ) -> ResultStream<Entry<K, P::Output>>
    where
        P: EntryProcessor<K, V>,
    {
        self.dispatch_all(BatchInvocation::new(Scope::filter(filter), processor))
    }

    pub fn invoke_all_entries<P>(&self, processor: P) -> ResultStream<Entry<K, P::Output>>
    where
        P: EntryProcessor<K, V>,
    {
        self.invoke_all_matching(Filter::always(), processor)
    }

    pub fn aggregate<A>(&self, aggregator: A) -> ResultStream<A::Output>
    where
        A: EntryAggregator<K, V>,
    {
        self.dispatch_aggregate(Aggregation::new(Scope::all(), aggregator))
    }

    pub fn aggregate_keys<A>(
        &self,
        keys: impl IntoIterator<Item = K>,
        aggregator: A,
    ) -> ResultStream<A::Output>
    where
        A: EntryAggregator<K, V>,
    {
        self.dispatch_aggregate(Aggregation::new(Scope::keys(keys), aggregator))
    }

    pub fn aggregate_matching<A>(&self, filter: Filter<K, V>, aggregator: A) -> ResultStream<A::Output>
    where
        A: EntryAggregator<K, V>,
    {
        self.dispatch_aggregate(Aggregation::new(Scope::filter(filter), aggregator))
    }

    // ---- map operations ----

    /// Emits the value, or nothing when `key` is absent.
    pub fn get(&self, key: K) -> ResultStream<V> {
        self.dispatch(translate::get(key))
    }

    /// Emits an entry for each listed key that is present.
    pub fn get_all(&self, keys: impl IntoIterator<Item = K>) -> ResultStream<Entry<K, V>> {
        self.dispatch_all(translate::get_all(keys))
            .filter(Entry::is_present)
    }

    pub fn put(&self, key: K, value: V) -> ResultStream<()> {
        self.put_with_expiry(key, value, Expiry::Default)
    }

    pub fn put_with_expiry(&self, key: K, value: V, expiry: Expiry) -> ResultStream<()> {
        self.checked(translate::put(key, value, expiry))
            .into_completion()
    }

    pub fn put_all(&self, entries: HashMap<K, V>) -> ResultStream<()> {
        self.dispatch_all(translate::put_all(entries))
            .into_completion()
    }

    /// Emits the removed value, or nothing when `key` was absent.
    pub fn remove(&self, key: K) -> ResultStream<V> {
        self.dispatch(translate::remove(key))
    }

    /// Removes `key` only while it maps to `value`.
    pub fn remove_value(&self, key: K, value: V) -> ResultStream<bool>
    where
        V: PartialEq,
    {
        self.dispatch(translate::remove_value(key, value))
    }

    pub fn remove_all(&self, keys: impl IntoIterator<Item = K>) -> ResultStream<()> {
        self.dispatch_all(translate::remove_all(Scope::keys(keys)))
            .into_completion()
    }

    pub fn remove_all_matching(&self, filter: Filter<K, V>) -> ResultStream<()> {
        self.dispatch_all(translate::remove_all(Scope::filter(filter)))
            .into_completion()
    }

    pub fn key_set(&self) -> ResultStream<K> {
        self.keys_of(None)
    }

    pub fn key_set_matching(&self, filter: Filter<K, V>) -> ResultStream<K> {
        self.keys_of(Some(filter))
    }

    pub fn entry_set(&self) -> ResultStream<Entry<K, V>> {
        self.dispatch_all(translate::entry_set(None))
    }

    pub fn entry_set_matching(&self, filter: Filter<K, V>) -> ResultStream<Entry<K, V>> {
        self.dispatch_all(translate::entry_set(Some(filter)))
    }

    pub fn values(&self) -> ResultStream<V> {
        self.entry_set().filter_map(Entry::into_value)
    }

    pub fn values_matching(&self, filter: Filter<K, V>) -> ResultStream<V> {
        self.entry_set_matching(filter).filter_map(Entry::into_value)
    }

    pub fn size(&self) -> ResultStream<usize> {
        self.dispatch_aggregate(translate::size())
    }

    pub fn is_empty(&self) -> ResultStream<bool> {
        self.size().map(|size| size == 0)
    }

    pub fn clear(&self) -> ResultStream<()> {
        self.remove_all_matching(Filter::always())
    }

    pub fn contains_key(&self, key: K) -> ResultStream<bool> {
        self.dispatch(translate::contains_key(key))
    }

    /// Always emits exactly one value.
    pub fn get_or_default(&self, key: K, default: V) -> ResultStream<V> {
        self.dispatch(translate::get_or_default(key))
            .map(move |value| value.unwrap_or_else(|| default.clone()))
    }

    /// Emits the value that prevented the write, or nothing when `value` was
    /// stored.
    pub fn put_if_absent(&self, key: K, value: V) -> ResultStream<V> {
        self.dispatch(translate::put_if_absent(key, value))
    }

    /// Emits the replaced value, or nothing when `key` was absent and
    /// therefore left alone.
    pub fn replace(&self, key: K, value: V) -> ResultStream<V> {
        self.dispatch(translate::replace(key, value))
    }

    /// Stores `value` only while `key` maps to `expected`.
    pub fn replace_value(&self, key: K, expected: V, value: V) -> ResultStream<bool>
    where
        V: PartialEq,
    {
        self.dispatch(translate::replace_value(key, expected, value))
    }

    /// `function` runs inside the cache only when `key` is absent; a `None`
    /// result stores nothing.
    pub fn compute_if_absent<F>(&self, key: K, function: F) -> ResultStream<V>
    where
        F: Fn(&K) -> Result<Option<V>> + Send + Sync + 'static,
    {
        self.dispatch(translate::compute_if_absent(key, function))
    }

    /// A `None` from `function` removes the entry.
    pub fn compute_if_present<F>(&self, key: K, function: F) -> ResultStream<V>
    where
        F: Fn(&K, &V) -> Result<Option<V>> + Send + Sync + 'static,
    {
        self.dispatch(translate::compute_if_present(key, function))
    }

    pub fn compute<F>(&self, key: K, function: F) -> ResultStream<V>
    where
        F: Fn(&K, Option<&V>) -> Result<Option<V>> + Send + Sync + 'static,
    {
        self.dispatch(translate::compute(key, function))
    }

    /// Stores `value` when absent, otherwise `function(current, value)`.
    pub fn merge<F>(&self, key: K, value: V, function: F) -> ResultStream<V>
    where
        F: Fn(&V, &V) -> Result<Option<V>> + Send + Sync + 'static,
    {
        self.dispatch(translate::merge(key, value, function))
    }

    pub fn replace_all<F>(&self, function: F) -> ResultStream<()>
    where
        F: Fn(&K, &V) -> Result<V> + Send + Sync + 'static,
    {
        self.replace_all_matching(Filter::always(), function)
    }

    pub fn replace_all_keys<F>(&self, keys: impl IntoIterator<Item = K>, function: F) -> ResultStream<()>
    where
        F: Fn(&K, &V) -> Result<V> + Send + Sync + 'static,
    {
        self.dispatch_all(translate::replace_all(Scope::keys(keys), function))
            .into_completion()
    }

    pub fn replace_all_matching<F>(&self, filter: Filter<K, V>, function: F) -> ResultStream<()>
    where
        F: Fn(&K, &V) -> Result<V> + Send + Sync + 'static,
    {
        self.dispatch_all(translate::replace_all(Scope::filter(filter), function))
            .into_completion()
    }

    fn keys_of(&self, filter: Option<Filter<K, V>>) -> ResultStream<K> {
        self.dispatch_all(translate::key_set(filter))
            .map(Entry::into_key)
    }

    fn dispatch<P>(&self, invocation: Invocation<K, P>) -> ResultStream<P::Output>
    where
        P: EntryProcessor<K, V>,
    {
        bridge::invoke(&self.cache, invocation)
    }

    fn dispatch_all<P>(&self, batch: BatchInvocation<K, V, P>) -> ResultStream<Entry<K, P::Output>>
    where
        P: EntryProcessor<K, V>,
    {
        bridge::invoke_all(&self.cache, batch)
    }

    fn dispatch_aggregate<A>(&self, aggregation: Aggregation<K, V, A>) -> ResultStream<A::Output>
    where
        A: EntryAggregator<K, V>,
    {
        bridge::aggregate(&self.cache, aggregation)
    }

    fn checked<P>(&self, invocation: Result<Invocation<K, P>>) -> ResultStream<P::Output>
    where
        P: EntryProcessor<K, V>,
    {
        match invocation {
            Ok(invocation) => self.dispatch(invocation),
            Err(e) => ResultStream::fail(e),
        }
    }
}
