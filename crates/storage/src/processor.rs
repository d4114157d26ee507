use crate::entry::MutableEntry;
use common::error::Result;

/// An opaque operation the cache applies to one entry while holding it.
///
/// `Ok(None)` means the entry was processed but there is nothing to report;
/// it is never confused with "not processed".
pub trait EntryProcessor<K, V>: Clone + Send + Sync + 'static {
    type Output: Send + 'static;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<Self::Output>>;
}

impl<K, V, R, F> EntryProcessor<K, V> for F
where
    F: Fn(&mut MutableEntry<K, V>) -> Result<Option<R>> + Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    type Output = R;

    fn process(&self, entry: &mut MutableEntry<K, V>) -> Result<Option<R>> {
        self(entry)
    }
}
