use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::Notify;

/// Bounded single-consumer queue that evicts the oldest item when full.
///
/// Producers never wait, so a slow subscriber can only lose its own backlog,
/// never stall the publisher.
pub struct FifoDropOldestQueue<T> {
    inner: Arc<FifoDropOldestInner<T>>,
}

struct FifoDropOldestInner<T> {
    buf: Mutex<VecDeque<T>>,
    capacity: usize,
    closed: AtomicBool,
    notify: Notify,
}

pub struct FifoDropOldestReceiver<T> {
    inner: Arc<FifoDropOldestInner<T>>,
}

impl<T> FifoDropOldestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);

        Self {
            inner: Arc::new(FifoDropOldestInner {
                buf: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                closed: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Push `value`, returning `true` when an older item had to be evicted.
    pub fn push_overwrite(&self, value: T) -> bool {
        let mut buf = self.inner.buf.lock().unwrap_or_else(PoisonError::into_inner);
        let evicted = if buf.len() >= self.inner.capacity {
            buf.pop_front().is_some()
        } else {
            false
        };
        buf.push_back(value);
        drop(buf);
        self.inner.notify.notify_one();
        evicted
    }

    /// No more items will be pushed; the receiver drains what is left and stops.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    pub fn receiver(&self) -> FifoDropOldestReceiver<T> {
        FifoDropOldestReceiver {
            inner: self.inner.clone(),
        }
    }
}

impl<T> FifoDropOldestReceiver<T> {
    pub fn try_recv(&self) -> Option<T> {
        self.inner
            .buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Wait for the next item; `None` once the queue is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            if let Some(value) = self.try_recv() {
                return Some(value);
            }
            if self.inner.closed.load(Ordering::Acquire) {
                return self.try_recv();
            }
            self.inner.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_drops_oldest() {
        let q = FifoDropOldestQueue::new(2);
        let rx = q.receiver();
        assert!(!q.push_overwrite(1));
        assert!(!q.push_overwrite(2));
        assert!(q.push_overwrite(3));

        assert_eq!(rx.try_recv(), Some(2));
        assert_eq!(rx.try_recv(), Some(3));
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn recv_drains_then_ends_after_close() {
        let q = FifoDropOldestQueue::new(4);
        let rx = q.receiver();
        q.push_overwrite("a");
        q.push_overwrite("b");
        q.close();

        assert_eq!(rx.recv().await, Some("a"));
        assert_eq!(rx.recv().await, Some("b"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn recv_wakes_on_push_from_another_task() {
        let q = Arc::new(FifoDropOldestQueue::new(4));
        let rx = q.receiver();

        let producer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                q.push_overwrite(7u32);
                q.close();
            })
        };

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(rx.recv().await, None);
        producer.await.unwrap();
    }
}
