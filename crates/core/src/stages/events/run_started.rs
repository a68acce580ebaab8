use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::{events::EventHeader, provider::Provider};

#[derive(Clone, Serialize)]
pub struct RunStarted {
    pub header: EventHeader,
    pub run_id: Uuid,
    pub topic: String,
    pub provider: Provider,
    pub output_path: PathBuf,
}

impl RunStarted {
    pub const EVENT_TYPE: &'static str = "run.started";

    pub fn new(run_id: Uuid, topic: &str, provider: Provider, output_path: PathBuf) -> Self {
        Self {
            header: EventHeader::new(None),
            run_id,
            topic: topic.to_string(),
            provider,
            output_path,
        }
    }
}

crate::impl_event!(RunStarted);
