use common::error::Result;

/// An opaque reduction over a set of present entries.
pub trait EntryAggregator<K, V>: Clone + Send + Sync + 'static {
    type Output: Send + 'static;

    fn aggregate(&self, entries: &[(K, V)]) -> Result<Self::Output>;
}

impl<K, V, R, F> EntryAggregator<K, V> for F
where
    F: Fn(&[(K, V)]) -> Result<R> + Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    type Output = R;

    fn aggregate(&self, entries: &[(K, V)]) -> Result<R> {
        self(entries)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl<K, V> EntryAggregator<K, V> for Count
where
    K: 'static,
    V: 'static,
{
    type Output = usize;

    fn aggregate(&self, entries: &[(K, V)]) -> Result<usize> {
        Ok(entries.len())
    }
}
