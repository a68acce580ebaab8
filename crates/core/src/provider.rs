use serde::Serialize;

use crate::config::Settings;

/// Text-generation backends speaking the OpenAI chat-completions dialect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Groq,
    Openai,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Groq => ProviderConfig {
                api_url: "https://api.groq.com/openai/v1/chat/completions",
                model: "llama-3.3-70b-versatile",
                env_var: Settings::GROQ_API_KEY,
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o",
                env_var: Settings::OPENAI_API_KEY,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::Openai => "OpenAI",
        }
    }

    /// Groq when its key is configured, OpenAI otherwise.
    pub fn detect(settings: &Settings) -> Self {
        if settings.groq_api_key.is_some() {
            Provider::Groq
        } else {
            Provider::Openai
        }
    }

    /// The configured key for this provider, if any.
    pub fn api_key(&self, settings: &Settings) -> Option<String> {
        match self {
            Provider::Groq => settings.groq_api_key.clone(),
            Provider::Openai => settings.openai_api_key.clone(),
        }
    }
}
