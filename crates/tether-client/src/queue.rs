//! Ordered producer/consumer hand-off.
//!
//! [`AsyncQueue`] is the foundational ordering primitive of the runtime: it
//! guarantees that items are delivered in the order they were put, and that a
//! consumer that arrives before any item is available still receives the
//! *next* item put — in order, never skipped, never duplicated.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

struct QueueState<T> {
    backlog: VecDeque<T>,
    waiters: VecDeque<oneshot::Sender<T>>,
}

/// Unbounded FIFO queue with suspending consumers.
///
/// `put` hands the item directly to the earliest suspended consumer if one is
/// waiting (FIFO fairness among waiters), otherwise buffers it. `get` drains
/// the oldest buffered item, or suspends until a matching `put`. Clones share
/// the same queue.
pub struct AsyncQueue<T> {
    inner: Arc<Mutex<QueueState<T>>>,
}

impl<T> Clone for AsyncQueue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Default for AsyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsyncQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueState {
                backlog: VecDeque::new(),
                waiters: VecDeque::new(),
            })),
        }
    }

    /// Deliver `item` to the earliest waiting consumer, or buffer it.
    ///
    /// Never blocks and never suspends. A waiter whose `get` future was
    /// dropped is skipped; the item goes to the next-earliest live waiter.
    pub fn put(&self, item: T) {
        let mut state = self.inner.lock();
        let mut item = item;
        while let Some(waiter) = state.waiters.pop_front() {
            match waiter.send(item) {
                Ok(()) => return,
                Err(returned) => item = returned,
            }
        }
        state.backlog.push_back(item);
    }

    /// Take the oldest buffered item, or suspend until one is put.
    pub async fn get(&self) -> T {
        let receiver = {
            let mut state = self.inner.lock();
            if let Some(item) = state.backlog.pop_front() {
                return item;
            }
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            receiver
        };
        match receiver.await {
            Ok(item) => item,
            // The paired sender sits in the waiter list until a put serves
            // it; it cannot be dropped while `&self` keeps the queue alive.
            Err(_) => std::future::pending().await,
        }
    }

    /// Take the oldest buffered item without suspending.
    pub fn try_get(&self) -> Option<T> {
        self.inner.lock().backlog.pop_front()
    }

    /// Number of buffered (undelivered) items.
    pub fn len(&self) -> usize {
        self.inner.lock().backlog.len()
    }

    /// Whether the backlog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    #[tokio::test]
    async fn buffered_items_drain_in_order() {
        let queue = AsyncQueue::new();
        queue.put(1);
        queue.put(2);
        queue.put(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.get().await, 1);
        assert_eq!(queue.get().await, 2);
        assert_eq!(queue.get().await, 3);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn waiting_consumer_receives_next_put() {
        let queue = AsyncQueue::new();
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;
        queue.put(7u32);
        assert_eq!(consumer.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn waiters_are_served_in_arrival_order() {
        let queue = AsyncQueue::new();
        let first = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;
        let second = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;

        queue.put(1u32);
        queue.put(2u32);
        assert_eq!(first.await.unwrap(), 1);
        assert_eq!(second.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn direct_handoff_skips_the_backlog() {
        let queue = AsyncQueue::new();
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;
        queue.put(9u32);
        assert_eq!(consumer.await.unwrap(), 9);
        // Handed straight to the waiter, never buffered.
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn dropped_waiter_is_skipped() {
        let queue: AsyncQueue<u32> = AsyncQueue::new();
        // Register a waiter, then abandon it.
        let abandoned = tokio::time::timeout(Duration::from_millis(1), queue.get()).await;
        assert!(abandoned.is_err());

        queue.put(5);
        assert_eq!(queue.get().await, 5);
    }

    #[tokio::test]
    async fn try_get_does_not_suspend() {
        let queue: AsyncQueue<u32> = AsyncQueue::new();
        assert_eq!(queue.try_get(), None);
        queue.put(4);
        assert_eq!(queue.try_get(), Some(4));
        assert_eq!(queue.try_get(), None);
    }

    proptest! {
        #[test]
        fn delivery_order_matches_put_order(items in proptest::collection::vec(any::<u32>(), 0..64)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let queue = AsyncQueue::new();
                for &item in &items {
                    queue.put(item);
                }
                for &item in &items {
                    assert_eq!(queue.get().await, item);
                }
            });
        }
    }
}
