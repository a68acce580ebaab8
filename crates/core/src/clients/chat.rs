use async_trait::async_trait;
use tracing::debug;

use crate::{
    clients::{TextGenerator, check_status, http_client},
    config::{Settings, require_key},
    error::{ReelError, Result},
    provider::Provider,
    stages::stage_ids,
};

/// OpenAI-compatible chat-completions client (OpenAI or Groq).
pub struct ChatClient {
    http: reqwest::Client,
    provider: Provider,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(provider: Provider, api_key: Option<String>) -> Self {
        Self {
            http: http_client(),
            provider,
            api_key,
            temperature: 0.7,
            max_tokens: 1200,
        }
    }

    pub fn from_settings(provider: Provider, settings: &Settings) -> Self {
        Self::new(provider, provider.api_key(settings))
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    fn name(&self) -> &'static str {
        self.provider.name()
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let config = self.provider.config();
        let api_key = require_key(self.api_key.as_deref(), config.env_var, stage_ids::SCRIPT)?;

        debug!(provider = self.name(), model = config.model, "requesting completion");
        let response = self
            .http
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system_prompt,
                    },
                    {
                        "role": "user",
                        "content": user_prompt,
                    },
                ],
                "response_format": { "type": "json_object" },
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            }))
            .send()
            .await
            .map_err(|e| ReelError::service(self.name(), e))?;

        let response = check_status(self.name(), response).await?;
        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ReelError::parse("chat completion response", e))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ReelError::Parse {
                what: "chat completion response",
                reason: format!("no message content in {}", body),
            })?;

        Ok(content.to_string())
    }
}
