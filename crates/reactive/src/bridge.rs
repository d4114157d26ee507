//! Adapters from the cache's future-returning primitives to [`ResultStream`].
//!
//! Each subscription clones the descriptor and the cache handle, so
//! resubscribing issues a fresh call instead of replaying an old result.

use crate::descriptor::{Aggregation, BatchInvocation, Invocation};
use crate::stream::{ResultStream, Subscription};
use common::error::Error;
use std::any::type_name;
use storage::{AsyncCache, CacheKey, CacheValue, Entry, EntryAggregator, EntryProcessor};
use tracing::debug;

/// Emits the processor's result, or nothing when the processor reported the
/// empty marker.
pub fn invoke<K, V, C, P>(cache: &C, invocation: Invocation<K, P>) -> ResultStream<P::Output>
where
    K: CacheKey,
    V: CacheValue,
    C: AsyncCache<K, V>,
    P: EntryProcessor<K, V>,
{
    let cache = cache.clone();
    ResultStream::new(move || {
        let cache = cache.clone();
        let Invocation { key, processor } = invocation.clone();
        debug!(processor = type_name::<P>(), "activating invoke");
        Subscription::spawn(async move { cache.invoke(key, processor).await })
    })
}

/// Emits one entry per key the cache processed, in no particular order.
/// Nothing is emitted until the whole batch has resolved.
pub fn invoke_all<K, V, C, P>(
    cache: &C,
    batch: BatchInvocation<K, V, P>,
) -> ResultStream<Entry<K, P::Output>>
where
    K: CacheKey,
    V: CacheValue,
    C: AsyncCache<K, V>,
    P: EntryProcessor<K, V>,
{
    let cache = cache.clone();
    ResultStream::new(move || {
        let cache = cache.clone();
        let BatchInvocation { scope, processor } = batch.clone();
        debug!(
            processor = type_name::<P>(),
            target = ?batch.target(),
            "activating invoke_all"
        );
        Subscription::spawn(async move {
            let results = cache.invoke_all(scope, processor).await?;
            Ok::<_, Error>(
                results
                    .into_iter()
                    .map(|(key, result)| Entry::new(key, result)),
            )
        })
    })
}

/// Emits the single aggregate result.
pub fn aggregate<K, V, C, A>(cache: &C, aggregation: Aggregation<K, V, A>) -> ResultStream<A::Output>
where
    K: CacheKey,
    V: CacheValue,
    C: AsyncCache<K, V>,
    A: EntryAggregator<K, V>,
{
    let cache = cache.clone();
    ResultStream::new(move || {
        let cache = cache.clone();
        let Aggregation { scope, aggregator } = aggregation.clone();
        debug!(
            aggregator = type_name::<A>(),
            target = ?aggregation.target(),
            "activating aggregate"
        );
        Subscription::spawn(async move {
            let result = cache.aggregate(scope, aggregator).await?;
            Ok::<_, Error>(Some(result))
        })
    })
}
