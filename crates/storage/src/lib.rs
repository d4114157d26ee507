//! The cache side of the facade: the three asynchronous primitives a cache
//! engine must provide, the entry model they operate on, and the processors
//! and aggregators the map-style operations are expressed with.

pub mod aggregator;
pub mod cache;
pub mod entry;
pub mod filter;
pub mod processor;
pub mod processors;

pub use aggregator::{Count, EntryAggregator};
pub use cache::local::LocalCache;
pub use cache::{AsyncCache, CacheKey, CacheValue};
pub use entry::{Entry, Expiry, MutableEntry, Mutation};
pub use filter::{Filter, Scope};
pub use processor::EntryProcessor;
