//! HTTP clients for the external services the pipeline depends on.
//!
//! Each service sits behind a small trait so stages can be driven by fakes in
//! tests and so a stage never needs to know which vendor it talks to.

pub mod chat;
pub mod google_tts;
pub mod openai;
pub mod pexels;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ReelError, Result},
    types::WordTiming,
};

pub use chat::ChatClient;
pub use google_tts::GoogleTranslateSpeech;
pub use openai::{OpenAiSpeech, OpenAiTranscriber};
pub use pexels::PexelsClient;

pub const USER_AGENT: &str = concat!("reelgen/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Encoded speech as returned by a synthesis service (mp3).
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub engine: &'static str,
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    fn name(&self) -> &'static str;
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTranscript {
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordTiming>,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<RawTranscript>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootageFile {
    pub link: String,
    pub width: u32,
    pub height: u32,
    pub file_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootageVideo {
    pub id: u64,
    pub page_url: String,
    pub files: Vec<FootageFile>,
}

#[async_trait]
pub trait FootageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<FootageVideo>>;
    async fn download(&self, link: &str, dest: &Path) -> Result<()>;
}

/// Turn a non-2xx response into a service error carrying the start of the body.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(300).collect();
    Err(ReelError::Service {
        service,
        reason: format!("HTTP {}: {}", status, body.trim()),
    })
}
