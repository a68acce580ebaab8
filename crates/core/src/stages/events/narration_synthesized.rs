use serde::Serialize;
use uuid::Uuid;

use crate::{events::EventHeader, types::AudioTrack};

#[derive(Clone, Serialize)]
pub struct NarrationSynthesized {
    pub header: EventHeader,
    pub audio: AudioTrack,
    pub engine: &'static str,
    /// Why the primary engine was skipped, when the fallback produced the audio.
    pub primary_error: Option<String>,
}

impl NarrationSynthesized {
    pub const EVENT_TYPE: &'static str = "narration.synthesized";

    pub fn new(
        parent_event_id: Uuid,
        audio: AudioTrack,
        engine: &'static str,
        primary_error: Option<String>,
    ) -> Self {
        Self {
            header: EventHeader::new(Some(parent_event_id)),
            audio,
            engine,
            primary_error,
        }
    }
}

crate::impl_event!(NarrationSynthesized);
