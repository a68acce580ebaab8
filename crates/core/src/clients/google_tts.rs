use async_trait::async_trait;
use tracing::debug;

use crate::{
    clients::{SpeechAudio, SpeechService, check_status, http_client},
    error::{ReelError, Result},
};

const TRANSLATE_TTS_URL: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Keyless Google Translate speech endpoint; the fallback narration engine.
///
/// The endpoint only accepts short inputs, so the text is sent in chunks and
/// the returned mp3 streams are concatenated (mp3 frames are self-delimiting).
pub struct GoogleTranslateSpeech {
    http: reqwest::Client,
    language: String,
}

impl GoogleTranslateSpeech {
    pub fn new(language: &str) -> Self {
        Self {
            http: http_client(),
            language: language.to_string(),
        }
    }
}

/// Split `text` on whitespace into chunks of at most `max_chars` characters.
/// A single word longer than the limit is cut into pieces.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.push(word.drain(..max_chars).collect());
        }
        if word.is_empty() {
            continue;
        }

        let needed = word.len() + usize::from(!current.is_empty());
        if current.chars().count() + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechService for GoogleTranslateSpeech {
    fn name(&self) -> &'static str {
        "Google Translate TTS"
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ReelError::InvalidInput {
                reason: "nothing to synthesize".to_string(),
            });
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(idx, total = %total, "requesting speech chunk");
            let response = self
                .http
                .get(TRANSLATE_TTS_URL)
                .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", self.language.as_str()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", chunk.chars().count().to_string().as_str()),
                ])
                .send()
                .await
                .map_err(|e| ReelError::service(self.name(), e))?;

            let response = check_status(self.name(), response).await?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ReelError::service(self.name(), e))?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(ReelError::Service {
                service: self.name(),
                reason: "empty audio body".to_string(),
            });
        }

        Ok(SpeechAudio {
            bytes: audio,
            engine: self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_limit_and_word_boundaries() {
        let text = "The ocean is salty because rivers carry dissolved minerals from rocks into the sea every single day";
        let chunks = chunk_text(text, 30);

        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
        assert_eq!(chunks.join(" "), text);
        assert_eq!(chunks[0], "The ocean is salty because");
    }

    #[test]
    fn long_words_are_cut() {
        let chunks = chunk_text("a supercalifragilistic b", 8);
        assert_eq!(chunks, vec!["a", "supercal", "ifragili", "stic b"]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text("  \n ", 100).is_empty());
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_request() {
        let tts = GoogleTranslateSpeech::new("en");
        assert!(matches!(
            tts.synthesize("   ").await,
            Err(ReelError::InvalidInput { .. })
        ));
    }
}
