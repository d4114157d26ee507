use common::error::{Error, Result};
use futures_util::future::{self, FutureExt};
use futures_util::stream::{self, BoxStream, FusedStream, Stream, StreamExt, TryStreamExt};
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{trace, warn};

type Activate<T> = dyn Fn() -> Subscription<T> + Send + Sync;

/// A cold stream of cache results.
///
/// Nothing happens until [`ResultStream::subscribe`] is called, and each
/// subscription runs the underlying cache call again. A subscription yields
/// zero or more `Ok` items and then either ends or yields exactly one `Err`.
pub struct ResultStream<T> {
    activate: Arc<Activate<T>>,
}

impl<T> Clone for ResultStream<T> {
    fn clone(&self) -> Self {
        Self {
            activate: self.activate.clone(),
        }
    }
}

impl<T: Send + 'static> ResultStream<T> {
    pub(crate) fn new<F>(activate: F) -> Self
    where
        F: Fn() -> Subscription<T> + Send + Sync + 'static,
    {
        Self {
            activate: Arc::new(activate),
        }
    }

    /// A stream whose every subscription fails with `error` without doing any
    /// work.
    pub fn fail(error: Error) -> Self {
        Self::new(move || Subscription::failed(error.clone()))
    }

    pub fn subscribe(&self) -> Subscription<T> {
        (self.activate)()
    }

    pub fn map<U, F>(self, f: F) -> ResultStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ResultStream::new(move || {
            let f = f.clone();
            self.subscribe().map_items(move |item| f(item))
        })
    }

    pub fn filter<F>(self, predicate: F) -> ResultStream<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter_map(move |item| predicate(&item).then_some(item))
    }

    pub fn filter_map<U, F>(self, f: F) -> ResultStream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        ResultStream::new(move || {
            let f = f.clone();
            self.subscribe().filter_map_items(move |item| f(item))
        })
    }

    /// Drops every item and keeps only the terminal signal.
    pub fn into_completion(self) -> ResultStream<()> {
        self.filter_map(|_| None)
    }

    /// Subscribes and gathers every item.
    pub async fn collect(&self) -> Result<Vec<T>> {
        self.subscribe().try_collect().await
    }

    /// Subscribes and waits for the first item, cancelling the rest.
    pub async fn first(&self) -> Result<Option<T>> {
        self.subscribe().next().await.transpose()
    }

    /// Subscribes and waits for the terminal signal, discarding items.
    pub async fn completion(&self) -> Result<()> {
        self.subscribe().try_for_each(|_| future::ok(())).await
    }
}

/// One activation of a [`ResultStream`].
///
/// Dropping it before the end aborts the in-flight cache call and discards
/// whatever that call would have produced.
pub struct Subscription<T> {
    inner:      BoxStream<'static, Result<T>>,
    terminated: bool,
}

impl<T: Send + 'static> Subscription<T> {
    pub(crate) fn new(inner: BoxStream<'static, Result<T>>) -> Self {
        Self {
            inner,
            terminated: false,
        }
    }

    pub(crate) fn failed(error: Error) -> Self {
        Self::new(stream::once(future::err(error)).boxed())
    }

    /// Runs `produce` on the current tokio runtime and streams whatever it
    /// resolves to.
    ///
    /// Items are only pushed once the whole future has settled, so a failure
    /// never follows a partial result.
    pub(crate) fn spawn<I, Fut>(produce: Fut) -> Self
    where
        Fut: Future<Output = Result<I>> + Send + 'static,
        I: IntoIterator<Item = T> + Send + 'static,
        I::IntoIter: Send,
    {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => return Self::failed(Error::NoRuntime),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let task = handle.spawn(async move {
            let settled = match AssertUnwindSafe(produce).catch_unwind().await {
                Ok(settled) => settled,
                Err(_) => Err(Error::TaskFailed("cache call panicked".into())),
            };
            match settled {
                Ok(items) => {
                    for item in items {
                        if tx.send(Ok(item)).is_err() {
                            trace!("subscriber gone, discarding remaining results");
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "cache call failed");
                    if tx.send(Err(e)).is_err() {
                        trace!("subscriber gone, discarding error");
                    }
                }
            }
        });
        Self::new(
            Inflight {
                rx: UnboundedReceiverStream::new(rx),
                task,
            }
            .boxed(),
        )
    }

    /// Withdraws interest. The in-flight cache call is aborted and the
    /// subscription yields nothing further, not even a terminal signal.
    pub fn cancel(&mut self) {
        self.inner = stream::empty().boxed();
        self.terminated = true;
    }

    fn map_items<U, F>(self, f: F) -> Subscription<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + 'static,
    {
        Subscription {
            inner:      self.inner.map_ok(f).boxed(),
            terminated: self.terminated,
        }
    }

    fn filter_map_items<U, F>(self, f: F) -> Subscription<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Option<U> + Send + 'static,
    {
        Subscription {
            inner:      self
                .inner
                .filter_map(move |item| future::ready(item.map(&f).transpose()))
                .boxed(),
            terminated: self.terminated,
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Err(e))) => {
                self.terminated = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<T> FusedStream for Subscription<T> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

struct Inflight<T> {
    rx:   UnboundedReceiverStream<Result<T>>,
    task: JoinHandle<()>,
}

impl<T> Stream for Inflight<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}

impl<T> Drop for Inflight<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn numbers(calls: Arc<AtomicUsize>) -> ResultStream<i32> {
        ResultStream::new(move || {
            let calls = calls.clone();
            Subscription::spawn(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3, 4])
            })
        })
    }

    #[tokio::test]
    async fn test_cold_until_subscribed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let stream = numbers(calls.clone());
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(stream.collect().await.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(stream.collect().await.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transforms() {
        let calls = Arc::new(AtomicUsize::new(0));
        let stream = numbers(calls)
            .filter(|n| n % 2 == 0)
            .map(|n| n * 10)
            .filter_map(|n| (n > 20).then_some(n.to_string()));
        assert_eq!(stream.collect().await.unwrap(), vec!["40".to_owned()]);
    }

    #[tokio::test]
    async fn test_completion_emits_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let done = numbers(calls).into_completion();
        assert!(done.collect().await.unwrap().is_empty());
        assert!(done.completion().await.is_ok());
    }

    #[tokio::test]
    async fn test_error_is_terminal() {
        let stream: ResultStream<i32> = ResultStream::new(|| {
            Subscription::spawn(async { Err::<Vec<i32>, _>(Error::collaborator("down")) })
        });
        let mut sub = stream.subscribe();
        assert_eq!(sub.next().await, Some(Err(Error::collaborator("down"))));
        assert!(sub.is_terminated());
        assert_eq!(sub.next().await, None);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_fail_reaches_every_subscriber() {
        let stream = ResultStream::<i32>::fail(Error::contract("nope"));
        assert_eq!(stream.first().await, Err(Error::contract("nope")));
        assert_eq!(stream.first().await, Err(Error::contract("nope")));
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let stream: ResultStream<i32> = ResultStream::new(|| {
            Subscription::spawn(async {
                if true {
                    panic!("collaborator exploded");
                }
                Ok(Vec::<i32>::new())
            })
        });
        let err = stream.collect().await.unwrap_err();
        assert!(matches!(err, Error::TaskFailed(_)));
    }

    #[tokio::test]
    async fn test_cancel_silences_subscription() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = numbers(calls).subscribe();
        sub.cancel();
        assert!(sub.is_terminated());
        assert_eq!(sub.next().await, None);
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn test_no_runtime_is_an_error() {
        let stream: ResultStream<i32> =
            ResultStream::new(|| Subscription::spawn(async { Ok(vec![1]) }));
        let mut sub = stream.subscribe();
        let first = futures_util::FutureExt::now_or_never(sub.next());
        assert_eq!(first, Some(Some(Err(Error::NoRuntime))));
    }
}
