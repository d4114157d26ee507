//! Streams over an asynchronous cache.
//!
//! [`RxCache`] turns the three primitives of an [`storage::AsyncCache`] into
//! cold [`ResultStream`]s and composes the usual map operations out of them.

pub mod bridge;
pub mod descriptor;
pub mod stream;
pub mod translate;

mod cache;
#[cfg(test)]
mod testing;

pub use cache::RxCache;
pub use descriptor::{Aggregation, BatchInvocation, Invocation, Target};
pub use stream::{ResultStream, Subscription};
