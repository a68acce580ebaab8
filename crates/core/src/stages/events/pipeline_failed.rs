use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{ErrorKind, ReelError},
    events::EventHeader,
};

#[derive(Clone, Debug, Serialize)]
pub struct PipelineFailed {
    pub header: EventHeader,
    pub stage: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

impl PipelineFailed {
    pub const EVENT_TYPE: &'static str = "pipeline.failed";

    /// `parent_event_id` is `None` when the run failed before it started.
    pub fn new(parent_event_id: Option<Uuid>, stage: &'static str, error: &ReelError) -> Self {
        Self {
            header: EventHeader::new(parent_event_id),
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

crate::impl_event!(PipelineFailed, terminal = true);
