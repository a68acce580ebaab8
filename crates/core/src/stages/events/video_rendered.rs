use serde::Serialize;
use uuid::Uuid;

use crate::{events::EventHeader, types::RenderedVideo};

#[derive(Clone, Serialize)]
pub struct VideoRendered {
    pub header: EventHeader,
    pub video: RenderedVideo,
}

impl VideoRendered {
    pub const EVENT_TYPE: &'static str = "video.rendered";

    pub fn new(parent_event_id: Uuid, video: RenderedVideo) -> Self {
        Self {
            header: EventHeader::new(Some(parent_event_id)),
            video,
        }
    }
}

crate::impl_event!(VideoRendered, terminal = true);
