use tokio::fs;
use tracing::{info, warn};

use crate::{
    clients::{SpeechAudio, SpeechService},
    error::{ReelError, Result},
    media,
    stages::{Stage, StageContext, stage_ids},
    types::{AudioTrack, NarrationSource, Script},
};

/// Which engine produced the narration.
#[derive(Debug)]
pub enum Narration {
    Primary(SpeechAudio),
    Fallback {
        audio: SpeechAudio,
        primary_error: ReelError,
    },
}

impl Narration {
    pub fn audio(&self) -> &SpeechAudio {
        match self {
            Narration::Primary(audio) | Narration::Fallback { audio, .. } => audio,
        }
    }

    pub fn source(&self) -> NarrationSource {
        match self {
            Narration::Primary(_) => NarrationSource::Primary,
            Narration::Fallback { .. } => NarrationSource::Fallback,
        }
    }
}

/// Try `primary`; on any failure call `fallback` exactly once.
pub async fn synthesize_with_fallback(
    primary: &dyn SpeechService,
    fallback: &dyn SpeechService,
    text: &str,
) -> Result<Narration> {
    let primary_error = match primary.synthesize(text).await {
        Ok(audio) => return Ok(Narration::Primary(audio)),
        Err(e) => e,
    };

    warn!(
        primary = primary.name(),
        fallback = fallback.name(),
        error = %primary_error,
        "primary speech engine failed, using fallback"
    );

    match fallback.synthesize(text).await {
        Ok(audio) => Ok(Narration::Fallback {
            audio,
            primary_error,
        }),
        Err(fallback_error) => Err(ReelError::Synthesis {
            primary: Box::new(primary_error),
            fallback: Box::new(fallback_error),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct NarratedAudio {
    pub track: AudioTrack,
    pub engine: &'static str,
    pub primary_error: Option<String>,
}

pub struct NarrationSynthesizer {
    primary: Box<dyn SpeechService>,
    fallback: Box<dyn SpeechService>,
}

impl NarrationSynthesizer {
    pub fn new(primary: Box<dyn SpeechService>, fallback: Box<dyn SpeechService>) -> Self {
        Self { primary, fallback }
    }
}

impl Stage for NarrationSynthesizer {
    const STAGE_ID: &'static str = stage_ids::NARRATION;
    const LABEL: &'static str = "Synthesizing narration";

    type Input = Script;
    type Output = NarratedAudio;

    async fn run(&self, script: &Script, ctx: &StageContext<'_>) -> Result<NarratedAudio> {
        let narration =
            synthesize_with_fallback(self.primary.as_ref(), self.fallback.as_ref(), &script.text)
                .await?;
        let source = narration.source();
        let engine = narration.audio().engine;

        let mp3_path = ctx.run_dir.narration_mp3_path();
        fs::write(&mp3_path, &narration.audio().bytes).await?;

        let wav_path = ctx.run_dir.narration_wav_path();
        media::transcode_to_wav(&mp3_path, &wav_path).await?;

        let (duration, sample_rate) = media::wav_duration(&wav_path)?;
        if duration <= 0.0 {
            return Err(ReelError::Media {
                tool: "hound",
                path: wav_path,
                reason: "narration has no samples".to_string(),
            });
        }

        info!(engine, duration, "narration synthesized");

        let primary_error = match narration {
            Narration::Primary(_) => None,
            Narration::Fallback { primary_error, .. } => Some(primary_error.to_string()),
        };

        Ok(NarratedAudio {
            track: AudioTrack {
                path: wav_path,
                duration,
                sample_rate,
                source,
            },
            engine,
            primary_error,
        })
    }
}
