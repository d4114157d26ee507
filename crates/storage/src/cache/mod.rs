pub mod local;

use crate::aggregator::EntryAggregator;
use crate::filter::Scope;
use crate::processor::EntryProcessor;
use common::error::Result;
use std::collections::HashMap;
use std::hash::Hash;

pub trait CacheKey: Clone + Eq + Hash + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Clone + Eq + Hash + Send + Sync + 'static {}

pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Send + Sync + 'static {}

/// The asynchronous primitives a cache engine exposes.
///
/// Every map-style operation is built on top of these three calls; an engine
/// only has to run processors and aggregators against its entries. Dropping a
/// returned future before it resolves is the cancellation signal.
pub trait AsyncCache<K, V>: Clone + Send + Sync + 'static
where
    K: CacheKey,
    V: CacheValue,
{
    /// Applies `processor` to the entry under `key`, present or not.
    fn invoke<P>(
        &self,
        key: K,
        processor: P,
    ) -> impl Future<Output = Result<Option<P::Output>>> + Send
    where
        P: EntryProcessor<K, V>;

    /// Applies `processor` to every entry selected by `scope` and resolves to
    /// one result per processed key. A key scope processes each listed key; a
    /// filter scope only processes present entries that match.
    fn invoke_all<P>(
        &self,
        scope: Scope<K, V>,
        processor: P,
    ) -> impl Future<Output = Result<HashMap<K, Option<P::Output>>>> + Send
    where
        P: EntryProcessor<K, V>;

    /// Reduces the present entries selected by `scope`.
    fn aggregate<A>(
        &self,
        scope: Scope<K, V>,
        aggregator: A,
    ) -> impl Future<Output = Result<A::Output>> + Send
    where
        A: EntryAggregator<K, V>;
}
