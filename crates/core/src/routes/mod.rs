use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{events::EnrichedEvent, queues::FifoDropOldestQueue};

/// Event type a subscriber can list to receive every event.
pub const ANY_EVENT: &str = "*";

pub struct Routes {
    pub table: HashMap<&'static str, Vec<Route>>,
    pub any: Vec<Route>,
}

impl Routes {
    pub fn matching(&self, event_type: &str) -> impl Iterator<Item = &Route> {
        self.table
            .get(event_type)
            .into_iter()
            .flatten()
            .chain(self.any.iter())
    }

    pub fn close_all(&self) {
        for route in self.table.values().flatten().chain(self.any.iter()) {
            route.inbox.close();
        }
    }
}

#[derive(Clone)]
pub struct Route {
    pub subscriber_id: &'static str,
    pub inbox: Arc<FifoDropOldestQueue<Arc<EnrichedEvent>>>,
    pub drops_total: Arc<AtomicU64>,
}

impl Route {
    pub fn deliver(&self, event: Arc<EnrichedEvent>) {
        if self.inbox.push_overwrite(event) {
            self.drops_total.fetch_add(1, Ordering::Relaxed);
        }
    }
}
