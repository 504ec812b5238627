//! Area chat assistant.
//!
//! Builds a prompt from the selected area, whether it is cached offline, and
//! the recent conversation, then asks a text-generation service for a reply.

mod generator;

pub use generator::{GenerateRequest, HttpGenerator, TextGenerator};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::MapArea;
use crate::coord::GeoBounds;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api";
pub const DEFAULT_MODEL: &str = "llama2";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 150;
/// Prompt budget in tokens.
pub const DEFAULT_CONTEXT_LIMIT: usize = 2048;

/// Rough token size used to budget the prompt.
const CHARS_PER_TOKEN: usize = 4;

/// Errors talking to the generation service.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Failed to reach assistant at {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Assistant returned HTTP {0}")]
    Status(u16),

    #[error("Failed to read assistant response: {0}")]
    Body(String),

    #[error("Failed to encode area context: {0}")]
    Context(#[from] serde_json::Error),

    #[error("Question is empty")]
    EmptyQuestion,
}

/// Generation service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub context_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Prompt line, `role: content`.
    fn line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// Area details embedded in the prompt as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaContext {
    pub area_name: String,
    pub landmarks: String,
    pub description: String,
    pub has_local_data: bool,
    pub bounds: GeoBounds,
}

impl AreaContext {
    pub fn new(area: &MapArea, has_local_data: bool) -> Self {
        Self {
            area_name: area.name.clone(),
            landmarks: area.landmarks.join(", "),
            description: area.description.clone(),
            has_local_data,
            bounds: area.bounds,
        }
    }
}

/// Opening message for a conversation about `area`.
pub fn greeting(area: &MapArea) -> ChatMessage {
    ChatMessage::assistant(format!(
        "Hi! I can help you learn about {}. What would you like to know?",
        area.name
    ))
}

/// Assembles the prompt, dropping the oldest history lines that do not fit
/// within `context_limit` tokens.
pub fn build_prompt(
    context: &AreaContext,
    history: &[ChatMessage],
    question: &str,
    context_limit: usize,
) -> Result<String, AssistantError> {
    let head = format!(
        "Context: You are a local guide for {} in San Francisco.\nArea Details: {}\n",
        context.area_name,
        serde_json::to_string(context)?
    );
    let tail = format!(
        "User Question: {}\n\nProvide a helpful response about this specific area. \
         If the question is about location or navigation, reference the landmarks.\n",
        question
    );

    let budget = context_limit.saturating_mul(CHARS_PER_TOKEN);
    let fixed = head.len() + tail.len() + "Previous Messages: \n".len();
    let mut remaining = budget.saturating_sub(fixed);

    let mut kept = Vec::new();
    for message in history.iter().rev() {
        let line = message.line();
        let cost = line.len() + 1;
        if cost > remaining {
            break;
        }
        remaining -= cost;
        kept.push(line);
    }
    if kept.len() < history.len() {
        debug!(
            dropped = history.len() - kept.len(),
            "Trimmed conversation history to fit the prompt"
        );
    }
    kept.reverse();

    Ok(format!(
        "{}Previous Messages: {}\n{}",
        head,
        kept.join("\n"),
        tail
    ))
}

/// Extracts the reply text from a generation response body.
///
/// Streaming services answer with one JSON object per line, each carrying a
/// `response` fragment; those fragments are concatenated. Anything else is
/// taken as plain text.
pub fn parse_response(body: &str) -> String {
    let mut fragments = Vec::new();
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => match value.get("response").and_then(|r| r.as_str()) {
                Some(fragment) => fragments.push(fragment.to_string()),
                None => return body.trim().to_string(),
            },
            Err(_) => return body.trim().to_string(),
        }
    }
    fragments.concat().trim().to_string()
}

/// Chat assistant over a [`TextGenerator`].
pub struct Assistant<G: TextGenerator> {
    generator: G,
    config: AssistantConfig,
}

impl<G: TextGenerator> Assistant<G> {
    pub fn new(generator: G, config: AssistantConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Asks `question` about `area` and returns the reply text.
    pub async fn ask(
        &self,
        area: &MapArea,
        has_local_data: bool,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        let context = AreaContext::new(area, has_local_data);
        let prompt = build_prompt(&context, history, question, self.config.context_limit)?;
        let request = GenerateRequest::new(&self.config, prompt);

        debug!(area = %area.id, model = %self.config.model, "Asking assistant");
        let body = self.generator.generate(&request).await?;
        Ok(parse_response(&body))
    }
}
