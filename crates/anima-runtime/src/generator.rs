//! Generation collaborator – OpenAI-compatible chat client.
//!
//! Talks to a locally running model server that exposes an OpenAI-compatible
//! `/v1/chat/completions` endpoint, such as [Ollama](https://ollama.com)
//! (`http://localhost:11434`).
//!
//! Failures are tagged rather than stringified: the engine reacts differently
//! to a server that is down ([`GenerateError::Unavailable`]), a reply that
//! took too long ([`GenerateError::TimedOut`]), and a reply that came back
//! blank ([`GenerateError::EmptyResponse`]). A generation failure never
//! aborts the surrounding cognitive cycle; the engine degrades to a fallback
//! line and the memory pipeline runs to completion regardless.

use std::time::Duration;

use anima_types::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors a generation collaborator can surface.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The model server could not be reached at all.
    #[error("generation backend unreachable: {0}")]
    Unavailable(String),
    /// The request exceeded the configured timeout.
    #[error("generation timed out after {0:?}")]
    TimedOut(Duration),
    /// The server answered, but with no usable text.
    #[error("generation backend returned an empty response")]
    EmptyResponse,
    /// The server answered with an unexpected status or shape.
    #[error("unexpected response from generation backend: {0}")]
    BadResponse(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator contract
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a single generation call needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The user-facing prompt for this turn.
    pub prompt: String,
    /// System prompt; skipped when empty.
    pub system_prompt: String,
    /// Prior conversation turns, oldest first.
    pub context: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Produces text from a prompt. May time out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerateError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes (OpenAI-compatible)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

// ─────────────────────────────────────────────────────────────────────────────
// OllamaGenerator
// ─────────────────────────────────────────────────────────────────────────────

/// Chat-completions client for a local Ollama instance.
///
/// Construct once and reuse across cognitive cycles.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaGenerator {
    /// Create a generator for `model` served at `base_url`
    /// (e.g. `"http://localhost:11434"`).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Assemble the message list: system prompt (when present), prior
    /// context, then the current prompt as the final user turn.
    fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.context.len() + 2);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage::system(request.system_prompt.clone()));
        }
        messages.extend(request.context.iter().cloned());
        messages.push(ChatMessage::user(request.prompt.clone()));
        messages
    }

    fn classify(&self, error: reqwest::Error) -> GenerateError {
        if error.is_timeout() {
            GenerateError::TimedOut(self.timeout)
        } else if error.is_connect() {
            GenerateError::Unavailable(error.to_string())
        } else {
            GenerateError::BadResponse(error.to_string())
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerateError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.model,
            messages: Self::build_messages(&request),
            stream: false,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?
            .error_for_status()
            .map_err(|e| GenerateError::BadResponse(e.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::BadResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use anima_types::Role;

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "current question".into(),
            system_prompt: "you are anima".into(),
            context: vec![
                ChatMessage::user("earlier question"),
                ChatMessage::assistant("earlier answer"),
            ],
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    #[test]
    fn messages_are_system_context_then_prompt() {
        let messages = OllamaGenerator::build_messages(&request());
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].content, "earlier answer");
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[3].content, "current question");
    }

    #[test]
    fn empty_system_prompt_is_skipped() {
        let mut req = request();
        req.system_prompt = String::new();
        let messages = OllamaGenerator::build_messages(&req);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn chat_request_serializes_sampling_parameters() {
        let body = ChatRequest {
            model: "llama3",
            messages: OllamaGenerator::build_messages(&request()),
            stream: false,
            temperature: 0.55,
            max_tokens: 512,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"model\":\"llama3\""));
        assert!(json.contains("\"stream\":false"));
        assert!(json.contains("\"temperature\":0.55"));
        assert!(json.contains("\"max_tokens\":512"));
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }

    #[tokio::test]
    async fn unreachable_server_reports_unavailable() {
        // Nothing listens on this port; the connect error must be tagged.
        let generator = OllamaGenerator::new(
            "http://127.0.0.1:1",
            "llama3",
            Duration::from_secs(5),
        );
        let err = generator.generate(request()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Unavailable(_)));
    }
}
