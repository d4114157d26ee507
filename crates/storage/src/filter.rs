use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

type Predicate<K, V> = dyn Fn(&K, &V) -> bool + Send + Sync;

/// A predicate over present entries, evaluated by the cache.
pub struct Filter<K, V>(Arc<Predicate<K, V>>);

impl<K, V> Clone for Filter<K, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<K, V> fmt::Debug for Filter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}

impl<K: 'static, V: 'static> Filter<K, V> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&K, &V) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn always() -> Self {
        Self::new(|_, _| true)
    }

    pub fn never() -> Self {
        Self::new(|_, _| false)
    }

    pub fn key_in(keys: impl IntoIterator<Item = K>) -> Self
    where
        K: Hash + Eq + Send + Sync,
    {
        let keys: HashSet<K> = keys.into_iter().collect();
        Self::new(move |k, _| keys.contains(k))
    }

    pub fn and(self, other: Self) -> Self {
        Self::new(move |k, v| self.evaluate(k, v) && other.evaluate(k, v))
    }

    pub fn or(self, other: Self) -> Self {
        Self::new(move |k, v| self.evaluate(k, v) || other.evaluate(k, v))
    }

    pub fn not(self) -> Self {
        Self::new(move |k, v| !self.evaluate(k, v))
    }
}

impl<K, V> Filter<K, V> {
    pub fn evaluate(&self, key: &K, value: &V) -> bool {
        (self.0)(key, value)
    }
}

/// The set of entries a batch operation or aggregation runs over.
pub enum Scope<K, V> {
    Keys(HashSet<K>),
    Filter(Filter<K, V>),
}

impl<K: Clone, V> Clone for Scope<K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Keys(keys) => Self::Keys(keys.clone()),
            Self::Filter(filter) => Self::Filter(filter.clone()),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Scope<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keys(keys) => f.debug_tuple("Keys").field(keys).finish(),
            Self::Filter(filter) => f.debug_tuple("Filter").field(filter).finish(),
        }
    }
}

impl<K: 'static, V: 'static> Scope<K, V> {
    /// Every entry in the cache.
    pub fn all() -> Self {
        Self::Filter(Filter::always())
    }

    pub fn keys(keys: impl IntoIterator<Item = K>) -> Self
    where
        K: Hash + Eq,
    {
        Self::Keys(keys.into_iter().collect())
    }

    pub fn filter(filter: Filter<K, V>) -> Self {
        Self::Filter(filter)
    }
}
