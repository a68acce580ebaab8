use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::{
    clients::{RawTranscript, SpeechAudio, SpeechService, Transcriber, check_status, http_client},
    config::{NarrationConfig, Settings, require_key},
    error::{ReelError, Result},
    stages::stage_ids,
};

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const MAX_SPEECH_INPUT_CHARS: usize = 4096;

/// OpenAI neural text-to-speech; the primary narration engine.
pub struct OpenAiSpeech {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(api_key: Option<String>, config: &NarrationConfig) -> Self {
        Self {
            http: http_client(),
            api_key,
            model: config.model.clone(),
            voice: config.voice.clone(),
        }
    }

    pub fn from_settings(settings: &Settings, config: &NarrationConfig) -> Self {
        Self::new(settings.openai_api_key.clone(), config)
    }
}

#[async_trait]
impl SpeechService for OpenAiSpeech {
    fn name(&self) -> &'static str {
        "OpenAI TTS"
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        let api_key = require_key(
            self.api_key.as_deref(),
            Settings::OPENAI_API_KEY,
            stage_ids::NARRATION,
        )?;

        let chars = text.chars().count();
        if chars > MAX_SPEECH_INPUT_CHARS {
            return Err(ReelError::InvalidInput {
                reason: format!(
                    "narration has {} characters, {} accepts at most {}",
                    chars,
                    self.name(),
                    MAX_SPEECH_INPUT_CHARS
                ),
            });
        }

        debug!(model = %self.model, voice = %self.voice, chars, "requesting speech");
        let response = self
            .http
            .post(SPEECH_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "input": text,
                "voice": self.voice,
                "response_format": "mp3",
            }))
            .send()
            .await
            .map_err(|e| ReelError::service(self.name(), e))?;

        let response = check_status(self.name(), response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReelError::service(self.name(), e))?;

        if bytes.is_empty() {
            return Err(ReelError::Service {
                service: self.name(),
                reason: "empty audio body".to_string(),
            });
        }

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            engine: self.name(),
        })
    }
}

/// OpenAI speech-to-text with word-level timestamps.
pub struct OpenAiTranscriber {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    language: String,
}

impl OpenAiTranscriber {
    pub fn new(api_key: Option<String>, language: &str) -> Self {
        Self {
            http: http_client(),
            api_key,
            model: "whisper-1".to_string(),
            language: language.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings, config: &NarrationConfig) -> Self {
        Self::new(settings.openai_api_key.clone(), &config.language)
    }
}

const TRANSCRIPTION_SERVICE: &str = "OpenAI transcription";

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<RawTranscript> {
        let api_key = require_key(
            self.api_key.as_deref(),
            Settings::OPENAI_API_KEY,
            stage_ids::CAPTIONS,
        )?;

        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "narration.wav".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| ReelError::service(TRANSCRIPTION_SERVICE, e))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .text("language", self.language.clone());

        debug!(audio = %audio.display(), model = %self.model, "requesting transcription");
        let response = self
            .http
            .post(TRANSCRIPTION_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReelError::service(TRANSCRIPTION_SERVICE, e))?;

        let response = check_status(TRANSCRIPTION_SERVICE, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ReelError::service(TRANSCRIPTION_SERVICE, e))?;

        parse_transcription(&body)
    }
}

fn parse_transcription(body: &str) -> Result<RawTranscript> {
    serde_json::from_str(body).map_err(|e| ReelError::parse("transcription response", e))
}
