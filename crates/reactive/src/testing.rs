use common::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storage::{
    AsyncCache, CacheKey, CacheValue, EntryAggregator, EntryProcessor, LocalCache, Scope,
};
use tokio::sync::Notify;

#[derive(Default)]
struct ProbeState {
    calls:     AtomicUsize,
    completed: AtomicUsize,
    failure:   Mutex<Option<Error>>,
    gate:      Mutex<Option<Arc<Notify>>>,
}

/// Wraps a [`LocalCache`], counting calls and optionally holding or failing
/// them.
pub(crate) struct Probe<K, V> {
    inner: LocalCache<K, V>,
    state: Arc<ProbeState>,
}

impl<K, V> Clone for Probe<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state: self.state.clone(),
        }
    }
}

impl<K, V> Probe<K, V> {
    pub(crate) fn new(inner: LocalCache<K, V>) -> Self {
        Self {
            inner,
            state: Arc::default(),
        }
    }

    /// Calls started, including ones that never finished.
    pub(crate) fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> usize {
        self.state.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_with(&self, error: Error) {
        *self.state.failure.lock().unwrap() = Some(error);
    }

    /// Every later call waits for a notification on the returned gate.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.state.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn release(&self) {
        *self.state.gate.lock().unwrap() = None;
    }

    async fn enter(&self) -> Result<()> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let failure = self.state.failure.lock().unwrap().clone();
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn leave<T>(&self, result: Result<T>) -> Result<T> {
        self.state.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

impl<K: CacheKey, V: CacheValue> AsyncCache<K, V> for Probe<K, V> {
    async fn invoke<P>(&self, key: K, processor: P) -> Result<Option<P::Output>>
    where
        P: EntryProcessor<K, V>,
    {
        self.enter().await?;
        let result = self.inner.invoke(key, processor).await;
        self.leave(result)
    }

    async fn invoke_all<P>(
        &self,
        scope: Scope<K, V>,
        processor: P,
    ) -> Result<HashMap<K, Option<P::Output>>>
    where
        P: EntryProcessor<K, V>,
    {
        self.enter().await?;
        let result = self.inner.invoke_all(scope, processor).await;
        self.leave(result)
    }

    async fn aggregate<A>(&self, scope: Scope<K, V>, aggregator: A) -> Result<A::Output>
    where
        A: EntryAggregator<K, V>,
    {
        self.enter().await?;
        let result = self.inner.aggregate(scope, aggregator).await;
        self.leave(result)
    }
}
