use serde::Serialize;
use uuid::Uuid;

use crate::events::EventHeader;

#[derive(Clone, Serialize)]
pub struct StageStarted {
    pub header: EventHeader,
    pub stage: &'static str,
    pub label: &'static str,
}

impl StageStarted {
    pub const EVENT_TYPE: &'static str = "stage.started";

    pub fn new(parent_event_id: Uuid, stage: &'static str, label: &'static str) -> Self {
        Self {
            header: EventHeader::new(Some(parent_event_id)),
            stage,
            label,
        }
    }
}

crate::impl_event!(StageStarted);
