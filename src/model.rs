//! Chat model invocation.
//!
//! The pipeline talks to models through the `ChatModel` trait so batch
//! logic can be exercised with scripted doubles in tests. The shipping
//! implementation posts to an OpenAI-compatible `/v1/chat/completions`
//! endpoint.
use crate::config::ModelConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use ureq::Agent;

/// Message role in a chat-style model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// One entry in the ordered message list sent to a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A chat-style text-generation model.
pub trait ChatModel {
    /// Run one request/response call and return the generated text.
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Invoke a model with a system+user pair and trim the response.
///
/// Failures propagate as errors; the orchestrator decides how to degrade
/// (generation falls back to the empty string, judgment falls back to the
/// generated value).
pub fn invoke(
    model: &dyn ChatModel,
    model_name: &str,
    system_instruction: &str,
    user_prompt: &str,
) -> Result<String> {
    let messages = [
        ChatMessage::system(system_instruction),
        ChatMessage::user(user_prompt),
    ];
    let text = model.complete(model_name, &messages)?;
    Ok(text.trim().to_string())
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat completion API.
pub struct HttpChatModel {
    agent: Agent,
    api_base: String,
    api_key: String,
}

impl HttpChatModel {
    pub fn new(config: &ModelConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(120)))
            .build()
            .into();
        HttpChatModel {
            agent,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

impl ChatModel for HttpChatModel {
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_base);
        let request = CompletionRequest { model, messages };
        let start = Instant::now();
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&request)
            .with_context(|| format!("chat completion request to {url}"))?;
        let parsed: CompletionResponse = response
            .body_mut()
            .read_json()
            .context("parse chat completion response")?;

        tracing::info!(
            model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            message_count = messages.len(),
            "chat completion complete"
        );

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion response has no choices"))?;
        choice
            .message
            .content
            .ok_or_else(|| anyhow!("chat completion choice has no content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoModel;

    impl ChatModel for EchoModel {
        fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String> {
            Ok(format!("  {}  ", messages.last().expect("messages").content))
        }
    }

    struct FailingModel;

    impl ChatModel for FailingModel {
        fn complete(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
            Err(anyhow!("quota exceeded"))
        }
    }

    #[test]
    fn invoke_sends_system_then_user_and_trims() {
        let text = invoke(&EchoModel, "test-model", "be brief", "hello").expect("invoke");
        assert_eq!(text, "hello");
    }

    #[test]
    fn invoke_propagates_failures_to_the_caller() {
        let err = invoke(&FailingModel, "test-model", "sys", "user").unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn chat_message_roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("x")).expect("serialize");
        assert!(json.contains(r#""role":"system""#));
    }
}
