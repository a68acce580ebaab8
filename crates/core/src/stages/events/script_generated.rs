use serde::Serialize;
use uuid::Uuid;

use crate::{events::EventHeader, types::Script};

#[derive(Clone, Serialize)]
pub struct ScriptGenerated {
    pub header: EventHeader,
    pub script: Script,
}

impl ScriptGenerated {
    pub const EVENT_TYPE: &'static str = "script.generated";

    pub fn new(parent_event_id: Uuid, script: Script) -> Self {
        Self {
            header: EventHeader::new(Some(parent_event_id)),
            script,
        }
    }
}

crate::impl_event!(ScriptGenerated);
