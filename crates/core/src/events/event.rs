use std::{any::Any, sync::Arc, time::SystemTime};

use erased_serde::Serialize as ErasedSerialize;
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

pub trait Event: Send + Sync + ErasedSerialize + 'static {
    fn event_id(&self) -> Uuid;
    fn parent_ids(&self) -> &[Uuid];
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> SystemTime;

    /// Terminal events end a run; sinks may stop listening after one.
    fn is_terminal(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

erased_serde::serialize_trait_object!(Event);

/// Identity shared by every concrete event.
#[derive(Clone, Debug, Serialize)]
pub struct EventHeader {
    pub event_id: Uuid,
    pub parent_ids: Vec<Uuid>,
    pub timestamp: SystemTime,
}

impl EventHeader {
    pub fn new(parent: Option<Uuid>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            parent_ids: parent.into_iter().collect(),
            timestamp: SystemTime::now(),
        }
    }
}

pub struct EnrichedEvent {
    pub event: Arc<dyn Event>,
    pub ingest_seq: u64,
    pub session_id: Uuid,
    pub ingested_at: Instant,
}

pub fn downcast_ref<T: 'static>(e: &Arc<dyn Event>) -> Option<&T> {
    e.as_any().downcast_ref::<T>()
}

/// Implements [`Event`] for a struct with a `header: EventHeader` field and an
/// `EVENT_TYPE` associated constant.
#[macro_export]
macro_rules! impl_event {
    ($ty:ty) => {
        $crate::impl_event!($ty, terminal = false);
    };
    ($ty:ty, terminal = $terminal:expr) => {
        impl $crate::events::Event for $ty {
            fn event_id(&self) -> ::uuid::Uuid {
                self.header.event_id
            }

            fn parent_ids(&self) -> &[::uuid::Uuid] {
                &self.header.parent_ids
            }

            fn event_type(&self) -> &'static str {
                Self::EVENT_TYPE
            }

            fn timestamp(&self) -> ::std::time::SystemTime {
                self.header.timestamp
            }

            fn is_terminal(&self) -> bool {
                $terminal
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self as &dyn ::std::any::Any
            }
        }
    };
}
