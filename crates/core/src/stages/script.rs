use serde::Deserialize;
use tracing::info;

use crate::{
    clients::TextGenerator,
    error::{ReelError, Result},
    stages::{Stage, StageContext, stage_ids},
    types::{Script, ScriptSegment, Topic},
};

const MAX_KEYWORDS: usize = 3;
const MIN_SEGMENTS: usize = 3;

const SYSTEM_PROMPT: &str = r#"You are a seasoned content writer for a short-form video channel that specializes in facts videos.

Your facts videos are concise: each one lasts less than 120 seconds when read aloud (about 250 words at most). They are engaging, original and surprising. When the user asks for a kind of facts video, you write it.

For example, for "Weird facts" you would write lines like:
- Bananas are berries, but strawberries aren't.
- A single cloud can weigh over a million pounds.
- Octopuses have three hearts and blue blood.

Split the narration into 3 to 12 segments, one sentence or beat per segment. For every segment give 1 to 3 English search terms for stock footage that matches it. Every search term must depict something visually concrete ("crying child", "rainy street", "cheetah running"), never an abstract idea ("emotional moment"). Prefer two-word terms over single words.

Return ONLY a JSON object, with no markdown and no text around it, in exactly this shape:
{"segments": [{"text": "First sentence of the narration.", "keywords": ["primary term", "alternate term"]}]}"#;

#[derive(Debug, Deserialize)]
struct ScriptResponse {
    segments: Vec<RawSegment>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    #[serde(default)]
    text: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// The outermost `{ ... }` slice, for replies that wrap JSON in prose.
fn outermost_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn decode(content: &str) -> Result<ScriptResponse> {
    let unfenced = strip_code_fence(content);
    match serde_json::from_str(unfenced) {
        Ok(parsed) => Ok(parsed),
        Err(first) => outermost_object(unfenced)
            .and_then(|slice| serde_json::from_str(slice).ok())
            .ok_or_else(|| ReelError::parse("script JSON", first)),
    }
}

/// Turn a completion into a validated [`Script`].
pub fn parse_script(topic: &Topic, content: &str) -> Result<Script> {
    if content.trim().is_empty() {
        return Err(ReelError::Parse {
            what: "script JSON",
            reason: "empty completion".to_string(),
        });
    }

    let response = decode(content)?;
    if response.segments.len() < MIN_SEGMENTS {
        return Err(ReelError::Parse {
            what: "script JSON",
            reason: format!(
                "{} segments, need at least {}",
                response.segments.len(),
                MIN_SEGMENTS
            ),
        });
    }

    let mut segments = Vec::with_capacity(response.segments.len());
    for (idx, raw) in response.segments.into_iter().enumerate() {
        let text = raw.text.trim().to_string();
        if text.is_empty() {
            return Err(ReelError::Parse {
                what: "script JSON",
                reason: format!("segment {} has no text", idx),
            });
        }

        let keywords: Vec<String> = raw
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            return Err(ReelError::Parse {
                what: "script JSON",
                reason: format!("segment {} has no usable keywords", idx),
            });
        }

        segments.push(ScriptSegment { text, keywords });
    }

    Ok(Script::from_segments(topic, segments))
}

pub struct ScriptGenerator {
    llm: Box<dyn TextGenerator>,
}

impl ScriptGenerator {
    pub fn new(llm: Box<dyn TextGenerator>) -> Self {
        Self { llm }
    }
}

impl Stage for ScriptGenerator {
    const STAGE_ID: &'static str = stage_ids::SCRIPT;
    const LABEL: &'static str = "Writing script";

    type Input = Topic;
    type Output = Script;

    async fn run(&self, topic: &Topic, _ctx: &StageContext<'_>) -> Result<Script> {
        let content = self.llm.complete(SYSTEM_PROMPT, topic.as_str()).await?;
        let script = parse_script(topic, &content)?;
        info!(
            provider = self.llm.name(),
            segments = script.segments.len(),
            words = script.text.split_whitespace().count(),
            "script generated"
        );
        Ok(script)
    }
}
