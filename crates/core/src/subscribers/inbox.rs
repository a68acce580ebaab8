use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{events::EnrichedEvent, queues::FifoDropOldestReceiver};

/// Receiving end of one subscriber's queue.
pub struct Inbox {
    subscriber_id: &'static str,
    receiver: FifoDropOldestReceiver<Arc<EnrichedEvent>>,
    drops_total: Arc<AtomicU64>,
}

impl Inbox {
    pub fn new(
        subscriber_id: &'static str,
        receiver: FifoDropOldestReceiver<Arc<EnrichedEvent>>,
        drops_total: Arc<AtomicU64>,
    ) -> Self {
        Self {
            subscriber_id,
            receiver,
            drops_total,
        }
    }

    pub fn subscriber_id(&self) -> &'static str {
        self.subscriber_id
    }

    pub fn try_recv(&self) -> Option<Arc<EnrichedEvent>> {
        self.receiver.try_recv()
    }

    /// Next event, or `None` once the bus is closed and the inbox drained.
    pub async fn recv(&self) -> Option<Arc<EnrichedEvent>> {
        self.receiver.recv().await
    }

    /// Events evicted because this subscriber fell behind.
    pub fn dropped(&self) -> u64 {
        self.drops_total.load(Ordering::Relaxed)
    }
}
