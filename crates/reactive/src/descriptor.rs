use storage::{CacheKey, Scope};

/// Which cache primitive a descriptor is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Key,
    Keys,
    Filter,
}

impl<K, V> From<&Scope<K, V>> for Target {
    fn from(scope: &Scope<K, V>) -> Self {
        match scope {
            Scope::Keys(_) => Self::Keys,
            Scope::Filter(_) => Self::Filter,
        }
    }
}

/// A processor aimed at one key.
#[derive(Debug, Clone)]
pub struct Invocation<K, P> {
    pub key:       K,
    pub processor: P,
}

impl<K: CacheKey, P> Invocation<K, P> {
    pub fn new(key: K, processor: P) -> Self {
        Self { key, processor }
    }

    pub fn target(&self) -> Target {
        Target::Key
    }
}

/// A processor aimed at a key set or a filter.
pub struct BatchInvocation<K, V, P> {
    pub scope:     Scope<K, V>,
    pub processor: P,
}

impl<K: CacheKey, V, P: Clone> Clone for BatchInvocation<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            scope:     self.scope.clone(),
            processor: self.processor.clone(),
        }
    }
}

impl<K: CacheKey, V, P> BatchInvocation<K, V, P> {
    pub fn new(scope: Scope<K, V>, processor: P) -> Self {
        Self { scope, processor }
    }

    pub fn target(&self) -> Target {
        Target::from(&self.scope)
    }
}

/// An aggregator aimed at a key set or a filter.
pub struct Aggregation<K, V, A> {
    pub scope:      Scope<K, V>,
    pub aggregator: A,
}

impl<K: CacheKey, V, A: Clone> Clone for Aggregation<K, V, A> {
    fn clone(&self) -> Self {
        Self {
            scope:      self.scope.clone(),
            aggregator: self.aggregator.clone(),
        }
    }
}

impl<K: CacheKey, V, A> Aggregation<K, V, A> {
    pub fn new(scope: Scope<K, V>, aggregator: A) -> Self {
        Self { scope, aggregator }
    }

    pub fn target(&self) -> Target {
        Target::from(&self.scope)
    }
}
