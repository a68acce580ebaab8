use std::path::PathBuf;

use crate::{
    error::{ReelError, Result},
    provider::Provider,
};

/// API credentials, read once from the environment.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub pexels_key: Option<String>,
}

impl Settings {
    pub const OPENAI_API_KEY: &'static str = "OPENAI_API_KEY";
    pub const GROQ_API_KEY: &'static str = "GROQ_API_KEY";
    pub const PEXELS_KEY: &'static str = "PEXELS_KEY";

    pub fn from_env() -> Self {
        Self {
            openai_api_key: read_key(Self::OPENAI_API_KEY),
            groq_api_key: read_key(Self::GROQ_API_KEY),
            pexels_key: read_key(Self::PEXELS_KEY),
        }
    }
}

fn read_key(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve a credential or fail with a config error naming the stage that needed it.
pub fn require_key<'a>(
    key: Option<&'a str>,
    env_var: &'static str,
    stage: &'static str,
) -> Result<&'a str> {
    key.ok_or(ReelError::Config { env_var, stage })
}

#[derive(Clone, Debug)]
pub struct NarrationConfig {
    pub model: String,
    pub voice: String,
    pub language: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "onyx".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FootageConfig {
    pub min_width: u32,
    pub min_height: u32,
    pub per_page: u32,
}

impl Default for FootageConfig {
    fn default() -> Self {
        Self {
            min_width: 1920,
            min_height: 1080,
            per_page: 15,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub caption_max_chars: usize,
    pub caption_font_size: u32,
}

impl RenderConfig {
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps as f64
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 24,
            caption_max_chars: 15,
            caption_font_size: 22,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub provider: Provider,
    pub output_path: PathBuf,
    pub keep_temp: bool,
    /// Parent of the per-run scratch directories; the user cache dir when unset.
    pub work_root: Option<PathBuf>,
    pub narration: NarrationConfig,
    pub footage: FootageConfig,
    pub render: RenderConfig,
}

impl PipelineConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            output_path: PathBuf::from("rendered_video.mp4"),
            keep_temp: false,
            work_root: None,
            narration: NarrationConfig::default(),
            footage: FootageConfig::default(),
            render: RenderConfig::default(),
        }
    }
}
