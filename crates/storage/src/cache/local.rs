use crate::aggregator::EntryAggregator;
use crate::cache::{AsyncCache, CacheKey, CacheValue};
use crate::entry::{MutableEntry, Mutation};
use crate::filter::{Filter, Scope};
use crate::processor::EntryProcessor;
use common::config::CacheConfig;
use common::error::Result;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::Op;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Clone)]
struct Stored<V> {
    value: V,
    ttl:   Option<Duration>,
    /// Unset when the write inherited the prior lifetime, whose remaining
    /// time then carries over instead of restarting.
    renew: bool,
}

struct StoredTtl;

impl<K, V> Expiry<K, Stored<V>> for StoredTtl {
    fn expire_after_create(
        &self,
        _key: &K,
        value: &Stored<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &K,
        value: &Stored<V>,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        if value.renew {
            value.ttl
        } else {
            duration_until_expiry
        }
    }
}

enum Applied<R> {
    Skipped,
    Done(Result<Option<R>>),
}

/// An in-process cache engine backed by moka.
///
/// Each processor runs while moka holds the key, so single-entry operations
/// are atomic. Batch operations are atomic per entry only.
pub struct LocalCache<K, V> {
    inner:       Arc<Cache<K, Stored<V>>>,
    default_ttl: Option<Duration>,
}

impl<K, V> Clone for LocalCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner:       self.inner.clone(),
            default_ttl: self.default_ttl,
        }
    }
}

impl<K: CacheKey, V: CacheValue> Default for LocalCache<K, V> {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl<K: CacheKey, V: CacheValue> LocalCache<K, V> {
    pub fn new(config: &CacheConfig) -> Self {
        debug!(
            capacity = config.capacity,
            default_ttl = ?config.default_ttl,
            "building local cache"
        );
        Self {
            inner:       Arc::new(
                Cache::builder()
                    .max_capacity(config.capacity)
                    .expire_after(StoredTtl)
                    .build(),
            ),
            default_ttl: config.default_ttl,
        }
    }

    async fn apply<P>(&self, key: K, processor: &P, guard: Option<&Filter<K, V>>) -> Applied<P::Output>
    where
        P: EntryProcessor<K, V>,
    {
        let default_ttl = self.default_ttl;
        let mut applied = Applied::Skipped;
        self.inner
            .entry(key.clone())
            .and_compute_with(|current| {
                let current = current.map(|e| e.into_value());
                let selected = match (guard, &current) {
                    (None, _) => true,
                    (Some(filter), Some(stored)) => filter.evaluate(&key, &stored.value),
                    (Some(_), None) => false,
                };
                let op = if selected {
                    let prior_ttl = current.as_ref().map(|s| s.ttl);
                    let mut entry = MutableEntry::new(key, current.map(|s| s.value));
                    match processor.process(&mut entry) {
                        Ok(output) => {
                            applied = Applied::Done(Ok(output));
                            match entry.into_mutation() {
                                Mutation::Unchanged => Op::Nop,
                                Mutation::Removed => Op::Remove,
                                Mutation::Set { value, expiry } => {
                                    let (ttl, renew) = match (expiry, prior_ttl) {
                                        (Some(expiry), _) => (expiry.resolve(default_ttl), true),
                                        (None, Some(ttl)) => (ttl, false),
                                        (None, None) => (default_ttl, true),
                                    };
                                    Op::Put(Stored { value, ttl, renew })
                                }
                            }
                        }
                        Err(e) => {
                            applied = Applied::Done(Err(e));
                            Op::Nop
                        }
                    }
                } else {
                    Op::Nop
                };
                std::future::ready(op)
            })
            .await;
        applied
    }

    fn matching_keys(&self, filter: &Filter<K, V>) -> Vec<K> {
        self.inner
            .iter()
            .filter(|(key, stored)| filter.evaluate(key, &stored.value))
            .map(|(key, _)| K::clone(&key))
            .collect()
    }

    async fn snapshot(&self, scope: Scope<K, V>) -> Vec<(K, V)> {
        match scope {
            Scope::Filter(filter) => self
                .inner
                .iter()
                .filter(|(key, stored)| filter.evaluate(key, &stored.value))
                .map(|(key, stored)| (K::clone(&key), stored.value))
                .collect(),
            Scope::Keys(keys) => {
                let mut entries = Vec::with_capacity(keys.len());
                for key in keys {
                    if let Some(stored) = self.inner.get(&key).await {
                        entries.push((key, stored.value));
                    }
                }
                entries
            }
        }
    }
}

impl<K: CacheKey, V: CacheValue> AsyncCache<K, V> for LocalCache<K, V> {
    async fn invoke<P>(&self, key: K, processor: P) -> Result<Option<P::Output>>
    where
        P: EntryProcessor<K, V>,
    {
        match self.apply(key, &processor, None).await {
            Applied::Done(result) => result,
            Applied::Skipped => Ok(None),
        }
    }

    async fn invoke_all<P>(
        &self,
        scope: Scope<K, V>,
        processor: P,
    ) -> Result<HashMap<K, Option<P::Output>>>
    where
        P: EntryProcessor<K, V>,
    {
        let (keys, guard) = match scope {
            Scope::Keys(keys) => (keys.into_iter().collect::<Vec<_>>(), None),
            Scope::Filter(filter) => (self.matching_keys(&filter), Some(filter)),
        };
        trace!(selected = keys.len(), "invoking processor over batch");

        let mut results = HashMap::with_capacity(keys.len());
        for key in keys {
            // A filtered entry may have changed since the key snapshot, so the
            // filter is evaluated again while the key is held.
            match self.apply(key.clone(), &processor, guard.as_ref()).await {
                Applied::Done(result) => {
                    results.insert(key, result?);
                }
                Applied::Skipped => {}
            }
        }
        Ok(results)
    }

    async fn aggregate<A>(&self, scope: Scope<K, V>, aggregator: A) -> Result<A::Output>
    where
        A: EntryAggregator<K, V>,
    {
        let entries = self.snapshot(scope).await;
        aggregator.aggregate(&entries)
    }
}
