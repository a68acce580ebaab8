use std::collections::HashMap;

use crate::subscribers::Inbox;

pub struct SubscriptionSpec {
    pub subscriber_id: &'static str,
    /// Event types to receive; `routes::ANY_EVENT` receives everything.
    pub event_types: Vec<&'static str>,
    pub capacity: usize,
}

pub struct Wiring {
    inboxes: HashMap<&'static str, Inbox>,
}

impl Wiring {
    pub fn new(inboxes: HashMap<&'static str, Inbox>) -> Self {
        Self { inboxes }
    }

    pub fn take(&mut self, subscriber_id: &'static str) -> Option<Inbox> {
        self.inboxes.remove(subscriber_id)
    }
}
