use serde::Serialize;
use uuid::Uuid;

use crate::{events::EventHeader, types::FootageClip};

#[derive(Clone, Serialize)]
pub struct FootageResolved {
    pub header: EventHeader,
    pub clips: Vec<FootageClip>,
    /// Segments that borrowed a neighbour's clip.
    pub reused_segments: usize,
}

impl FootageResolved {
    pub const EVENT_TYPE: &'static str = "footage.resolved";

    pub fn new(parent_event_id: Uuid, clips: Vec<FootageClip>) -> Self {
        let reused_segments = clips
            .iter()
            .map(|c| c.covers_segments.len().saturating_sub(1))
            .sum();
        Self {
            header: EventHeader::new(Some(parent_event_id)),
            clips,
            reused_segments,
        }
    }
}

crate::impl_event!(FootageResolved);
