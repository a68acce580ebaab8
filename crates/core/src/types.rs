use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReelError::InvalidInput {
                reason: "topic must not be empty".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub text: String,
    /// Visual search terms, primary first.
    pub keywords: Vec<String>,
}

impl ScriptSegment {
    pub fn primary_keyword(&self) -> &str {
        self.keywords.first().map(String::as_str).unwrap_or_default()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub topic: String,
    pub text: String,
    pub segments: Vec<ScriptSegment>,
}

impl Script {
    pub fn from_segments(topic: &Topic, segments: Vec<ScriptSegment>) -> Self {
        let text = segments
            .iter()
            .map(|seg| seg.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            topic: topic.as_str().to_string(),
            text,
            segments,
        }
    }

    pub fn keywords(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.primary_keyword()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrationSource {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub duration: f64,
    pub sample_rate: u32,
    pub source: NarrationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordTimings {
    pub words: Vec<WordTiming>,
    /// Duration of the narration these timings were aligned against.
    pub duration: f64,
}

impl WordTimings {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootageClip {
    pub segment_index: usize,
    pub keyword: String,
    pub source_url: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub window: TimeWindow,
    /// Segments whose windows this clip spans, its own included. More than one
    /// entry means neighbours without footage were merged into this clip.
    pub covers_segments: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub window: TimeWindow,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_rejects_blank_input() {
        assert!(matches!(
            Topic::new("   "),
            Err(ReelError::InvalidInput { .. })
        ));
        assert_eq!(
            Topic::new("  Why is the ocean salty? ").unwrap().as_str(),
            "Why is the ocean salty?"
        );
    }

    #[test]
    fn script_text_joins_segments() {
        let topic = Topic::new("ocean").unwrap();
        let script = Script::from_segments(
            &topic,
            vec![
                ScriptSegment {
                    text: " Rivers carry minerals. ".into(),
                    keywords: vec!["river rocks".into(), "flowing river".into()],
                },
                ScriptSegment {
                    text: "Vents add more.".into(),
                    keywords: vec!["hydrothermal vent".into()],
                },
            ],
        );
        assert_eq!(script.text, "Rivers carry minerals. Vents add more.");
        assert_eq!(script.keywords(), vec!["river rocks", "hydrothermal vent"]);
        assert_eq!(script.segments[0].word_count(), 3);
    }
}
