use serde::Serialize;
use uuid::Uuid;

use crate::{events::EventHeader, types::WordTimings};

#[derive(Clone, Serialize)]
pub struct CaptionsAligned {
    pub header: EventHeader,
    pub timings: WordTimings,
}

impl CaptionsAligned {
    pub const EVENT_TYPE: &'static str = "captions.aligned";

    pub fn new(parent_event_id: Uuid, timings: WordTimings) -> Self {
        Self {
            header: EventHeader::new(Some(parent_event_id)),
            timings,
        }
    }
}

crate::impl_event!(CaptionsAligned);
