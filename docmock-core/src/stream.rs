//! Lazily evaluated async sequences over store contents.
//!
//! Enumerations (root collections, documents of a collection, `get_all`) are exposed
//! as [`BoxStream`]s. Nothing is read until the stream is first polled; at that point
//! the current set of keys is captured and yielded one element at a time. Every call
//! produces a fresh, finite stream rather than a live cursor.

use futures::{
    future::Future,
    stream::{self, BoxStream, StreamExt, TryStreamExt},
};

use crate::error::StoreResult;

/// Builds a stream that awaits `fetch` on first poll and then yields its items in order.
///
/// An error from `fetch` is yielded as the only element.
pub fn snapshot_stream<T, F>(fetch: F) -> BoxStream<'static, StoreResult<T>>
where
    T: Send + 'static,
    F: Future<Output = StoreResult<Vec<T>>> + Send + 'static,
{
    stream::once(fetch)
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[tokio::test]
    async fn yields_items_in_order() {
        let items = snapshot_stream(async { Ok(vec![1, 2, 3]) })
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        assert_eq!(items, [1, 2, 3]);
    }

    #[tokio::test]
    async fn fetch_is_deferred_until_polled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut items = snapshot_stream(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["a"])
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(items.next().await, Some(Ok("a")));
        assert_eq!(items.next().await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_error_is_yielded() {
        let items = snapshot_stream::<u8, _>(async { Err(StoreError::InvalidArgument("nope".into())) })
            .collect::<Vec<_>>()
            .await;

        assert_eq!(items, [Err(StoreError::InvalidArgument("nope".into()))]);
    }
}
