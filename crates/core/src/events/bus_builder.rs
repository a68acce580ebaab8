use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use thiserror::Error;
use uuid::Uuid;

use crate::{
    events::EventBus,
    queues::FifoDropOldestQueue,
    routes::{ANY_EVENT, Route, Routes},
    subscribers::{Inbox, SubscriptionSpec, Wiring},
};

pub struct BusConfig {
    pub session_id: Uuid,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
        }
    }
}

#[derive(Default)]
pub struct BusMetrics {
    pub published_total: AtomicU64,
    pub unrouted_publish_total: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.published_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unrouted(&self, _event_type: &'static str) {
        self.unrouted_publish_total.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("empty subscriber_id")]
    EmptySubscriberId,

    #[error("duplicate subscriber_id={0}")]
    DuplicateSubscriber(&'static str),

    #[error("subscriber_id={0} has no inputs")]
    NoInputs(&'static str),

    #[error("subscriber_id={0} has empty event_type")]
    EmptyEventType(&'static str),

    #[error("subscriber_id={subscriber_id} has duplicate input event_type={event_type}")]
    DuplicateInput {
        subscriber_id: &'static str,
        event_type: &'static str,
    },

    #[error("subscriber_id={0} capacity must be > 0")]
    ZeroCapacity(&'static str),
}

fn validate(subs: &[SubscriptionSpec]) -> Result<(), SubscriptionError> {
    let mut seen_subscribers: HashSet<&'static str> = HashSet::new();
    for s in subs {
        if s.subscriber_id.trim().is_empty() {
            return Err(SubscriptionError::EmptySubscriberId);
        }
        if !seen_subscribers.insert(s.subscriber_id) {
            return Err(SubscriptionError::DuplicateSubscriber(s.subscriber_id));
        }
        if s.event_types.is_empty() {
            return Err(SubscriptionError::NoInputs(s.subscriber_id));
        }
        if s.capacity == 0 {
            return Err(SubscriptionError::ZeroCapacity(s.subscriber_id));
        }

        let mut seen_inputs: HashSet<&'static str> = HashSet::new();
        for &event_type in &s.event_types {
            if event_type.trim().is_empty() {
                return Err(SubscriptionError::EmptyEventType(s.subscriber_id));
            }
            if !seen_inputs.insert(event_type) {
                return Err(SubscriptionError::DuplicateInput {
                    subscriber_id: s.subscriber_id,
                    event_type,
                });
            }
        }
    }
    Ok(())
}

pub struct EventBusBuilder {
    cfg: BusConfig,
    subs: Vec<SubscriptionSpec>,
}

impl EventBusBuilder {
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            subs: Vec::new(),
        }
    }

    pub fn subscribe(mut self, s: SubscriptionSpec) -> Self {
        self.subs.push(s);
        self
    }

    pub fn build(self) -> Result<(EventBus, Wiring), SubscriptionError> {
        validate(&self.subs)?;

        let mut table: HashMap<&'static str, Vec<Route>> = HashMap::new();
        let mut any = Vec::new();
        let mut inboxes: HashMap<&'static str, Inbox> = HashMap::new();
        let metrics = Arc::new(BusMetrics::new());

        for spec in self.subs {
            // One inbox per subscriber keeps its events in publish order.
            let queue = Arc::new(FifoDropOldestQueue::new(spec.capacity));
            let drops_total = Arc::new(AtomicU64::new(0));
            let route = Route {
                subscriber_id: spec.subscriber_id,
                inbox: Arc::clone(&queue),
                drops_total: Arc::clone(&drops_total),
            };

            if spec.event_types.contains(&ANY_EVENT) {
                any.push(route);
            } else {
                for &event_type in &spec.event_types {
                    table.entry(event_type).or_default().push(route.clone());
                }
            }

            inboxes.insert(
                spec.subscriber_id,
                Inbox::new(spec.subscriber_id, queue.receiver(), drops_total),
            );
        }

        let bus = EventBus::new(self.cfg, Routes { table, any }, metrics);
        Ok((bus, Wiring::new(inboxes)))
    }
}

/// Build a bus with a fresh session id.
pub fn bus_builder() -> EventBusBuilder {
    EventBusBuilder::new(BusConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventHeader, downcast_ref};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Ping {
        header: EventHeader,
        n: u32,
    }

    impl Ping {
        const EVENT_TYPE: &'static str = "test.ping";

        fn new(n: u32) -> Self {
            Self {
                header: EventHeader::new(None),
                n,
            }
        }
    }

    crate::impl_event!(Ping);

    #[derive(Serialize)]
    struct Pong {
        header: EventHeader,
    }

    impl Pong {
        const EVENT_TYPE: &'static str = "test.pong";
    }

    crate::impl_event!(Pong, terminal = true);

    fn spec(id: &'static str, types: Vec<&'static str>, capacity: usize) -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: id,
            event_types: types,
            capacity,
        }
    }

    #[test]
    fn routes_by_event_type_and_wildcard() {
        let (bus, mut wiring) = bus_builder()
            .subscribe(spec("pings", vec![Ping::EVENT_TYPE], 8))
            .subscribe(spec("all", vec![ANY_EVENT], 8))
            .build()
            .unwrap();
        let pings = wiring.take("pings").unwrap();
        let all = wiring.take("all").unwrap();

        bus.publish(Arc::new(Ping::new(1)));
        bus.publish(Arc::new(Pong {
            header: EventHeader::new(None),
        }));

        let first = pings.try_recv().unwrap();
        assert_eq!(downcast_ref::<Ping>(&first.event).unwrap().n, 1);
        assert!(pings.try_recv().is_none());

        let a = all.try_recv().unwrap();
        let b = all.try_recv().unwrap();
        assert_eq!(a.ingest_seq, 0);
        assert_eq!(b.ingest_seq, 1);
        assert!(b.event.is_terminal());
        assert_eq!(a.session_id, bus.session_id());
    }

    #[test]
    fn unrouted_events_are_counted() {
        let (bus, _wiring) = bus_builder()
            .subscribe(spec("pings", vec![Ping::EVENT_TYPE], 1))
            .build()
            .unwrap();
        bus.publish(Arc::new(Pong {
            header: EventHeader::new(None),
        }));
        assert_eq!(
            bus.metrics().unrouted_publish_total.load(Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn slow_subscriber_loses_oldest_events() {
        let (bus, mut wiring) = bus_builder()
            .subscribe(spec("slow", vec![Ping::EVENT_TYPE], 2))
            .build()
            .unwrap();
        let inbox = wiring.take("slow").unwrap();

        for n in 0..5 {
            bus.publish(Arc::new(Ping::new(n)));
        }

        assert_eq!(inbox.dropped(), 3);
        let kept: Vec<u32> = std::iter::from_fn(|| inbox.try_recv())
            .map(|e| downcast_ref::<Ping>(&e.event).unwrap().n)
            .collect();
        assert_eq!(kept, vec![3, 4]);
    }

    #[tokio::test]
    async fn close_ends_inboxes_after_drain() {
        let (bus, mut wiring) = bus_builder()
            .subscribe(spec("sink", vec![Ping::EVENT_TYPE], 4))
            .build()
            .unwrap();
        let inbox = wiring.take("sink").unwrap();

        bus.publish(Arc::new(Ping::new(1)));
        bus.close();
        bus.publish(Arc::new(Ping::new(2)));

        assert!(inbox.recv().await.is_some());
        assert!(inbox.recv().await.is_none());
    }

    #[test]
    fn events_serialize_as_trait_objects() {
        let event: Arc<dyn Event> = Arc::new(Ping::new(9));
        let json = serde_json::to_value(&*event).unwrap();
        assert_eq!(json["n"], 9);
        assert!(json["header"]["event_id"].is_string());
    }

    #[test]
    fn builder_rejects_bad_subscriptions() {
        let err = |specs: Vec<SubscriptionSpec>| {
            let mut b = bus_builder();
            for s in specs {
                b = b.subscribe(s);
            }
            b.build().err()
        };

        assert_eq!(
            err(vec![spec(" ", vec!["x"], 1)]),
            Some(SubscriptionError::EmptySubscriberId)
        );
        assert_eq!(
            err(vec![spec("a", vec!["x"], 1), spec("a", vec!["y"], 1)]),
            Some(SubscriptionError::DuplicateSubscriber("a"))
        );
        assert_eq!(
            err(vec![spec("a", vec![], 1)]),
            Some(SubscriptionError::NoInputs("a"))
        );
        assert_eq!(
            err(vec![spec("a", vec!["x", "x"], 1)]),
            Some(SubscriptionError::DuplicateInput {
                subscriber_id: "a",
                event_type: "x"
            })
        );
        assert_eq!(
            err(vec![spec("a", vec![""], 1)]),
            Some(SubscriptionError::EmptyEventType("a"))
        );
        assert_eq!(
            err(vec![spec("a", vec!["x"], 0)]),
            Some(SubscriptionError::ZeroCapacity("a"))
        );
    }
}
