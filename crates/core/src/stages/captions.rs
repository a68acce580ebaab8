use tokio::fs;
use tracing::{info, warn};

use crate::{
    clients::Transcriber,
    error::Result,
    stages::{Stage, StageContext, stage_ids},
    timeline::normalize_timings,
    types::{AudioTrack, WordTimings},
};

pub struct CaptionAligner {
    transcriber: Box<dyn Transcriber>,
}

impl CaptionAligner {
    pub fn new(transcriber: Box<dyn Transcriber>) -> Self {
        Self { transcriber }
    }
}

impl Stage for CaptionAligner {
    const STAGE_ID: &'static str = stage_ids::CAPTIONS;
    const LABEL: &'static str = "Aligning captions";

    type Input = AudioTrack;
    type Output = WordTimings;

    async fn run(&self, audio: &AudioTrack, ctx: &StageContext<'_>) -> Result<WordTimings> {
        let transcript = self.transcriber.transcribe(&audio.path).await?;
        let json = serde_json::to_vec_pretty(&transcript).map_err(std::io::Error::from)?;
        fs::write(ctx.run_dir.transcript_path(), json).await?;

        let raw_words = transcript.words.len();
        let timings = normalize_timings(transcript.words, audio.duration);

        if timings.is_empty() {
            warn!("transcription returned no words, captions will be empty");
        } else if timings.len() < raw_words {
            warn!(
                dropped = raw_words - timings.len(),
                "discarded blank or invalid word timings"
            );
        }
        info!(words = timings.len(), duration = timings.duration, "captions aligned");

        Ok(timings)
    }
}
