use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    events::{BusConfig, BusMetrics, EnrichedEvent, Event},
    routes::Routes,
};

/// Fan-out of pipeline events to named subscribers.
///
/// Publishing is synchronous and never waits on a subscriber.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

struct EventBusInner {
    session_id: Uuid,
    next_ingest_seq: AtomicU64,
    routes: Routes,
    metrics: Arc<BusMetrics>,
    closed: AtomicBool,
}

impl EventBus {
    pub fn new(cfg: BusConfig, routes: Routes, metrics: Arc<BusMetrics>) -> Self {
        Self {
            inner: Arc::new(EventBusInner {
                session_id: cfg.session_id,
                next_ingest_seq: AtomicU64::new(0),
                routes,
                metrics,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn publish(&self, event: Arc<dyn Event>) {
        let event_type = event.event_type();
        if self.inner.closed.load(Ordering::Acquire) {
            debug!(event_type, "publish after close ignored");
            return;
        }

        let ingest_seq = self.inner.next_ingest_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.metrics.record_published();

        let enriched_event = Arc::new(EnrichedEvent {
            event,
            session_id: self.inner.session_id,
            ingest_seq,
            ingested_at: Instant::now(),
        });

        let mut delivered = 0usize;
        for route in self.inner.routes.matching(event_type) {
            route.deliver(Arc::clone(&enriched_event));
            delivered += 1;
        }

        if delivered == 0 {
            self.inner.metrics.record_unrouted(event_type);
        }
        trace!(event_type, ingest_seq, delivered, "event published");
    }

    /// Stop accepting events. Subscribers drain what is queued, then see the end.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            self.inner.routes.close_all();
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn metrics(&self) -> &BusMetrics {
        &self.inner.metrics
    }
}
