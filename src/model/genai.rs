//! GenAI-based model gateway implementation
//!
//! This module provides a [`ModelGateway`] backed by the `genai` crate,
//! supporting multiple providers (Ollama, OpenAI, Claude, Gemini, Grok, Groq).

use super::error::ModelError;
use super::gateway::{ContentStream, ModelGateway};
use super::types::ModelPrompt;
use async_trait::async_trait;
use futures_util::StreamExt;
use genai::chat::{
    ChatMessage as GenAiChatMessage, ChatOptions, ChatRequest, ChatStreamEvent, ContentPart,
};
use genai::Client;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error};

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Ollama local inference
    Ollama,
    /// OpenAI GPT models
    OpenAI,
    /// Anthropic Claude
    Claude,
    /// Google Gemini
    Gemini,
    /// xAI Grok
    Grok,
    /// Groq
    Groq,
}

impl Provider {
    /// Returns the provider prefix for genai model strings
    fn prefix(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
            Provider::Grok => "grok",
            Provider::Groq => "groq",
        }
    }

    /// Returns the provider name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama",
            Provider::OpenAI => "OpenAI",
            Provider::Claude => "Claude",
            Provider::Gemini => "Gemini",
            Provider::Grok => "Grok",
            Provider::Groq => "Groq",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            "claude" => Ok(Provider::Claude),
            "gemini" => Ok(Provider::Gemini),
            "grok" => Ok(Provider::Grok),
            "groq" => Ok(Provider::Groq),
            other => Err(format!(
                "unknown provider: {}. Valid options: ollama, openai, claude, gemini, grok, groq",
                other
            )),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// GenAI-based model gateway
///
/// Provider credentials and endpoints are configured via the standard genai
/// environment variables (`OLLAMA_HOST`, `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
/// `GOOGLE_API_KEY`, ...).
///
/// # Thread Safety
///
/// The gateway is thread-safe and can be shared across tasks using `Arc`.
pub struct GenAiGateway {
    /// GenAI client instance
    client: Client,
    /// Full model identifier (e.g. "ollama:qwen2.5vl:7b")
    model: String,
    /// Provider type
    provider: Provider,
    /// Per-call deadline
    timeout: Duration,
}

impl GenAiGateway {
    /// Creates a new gateway for the given provider and model
    pub fn new(provider: Provider, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        let full_model = format!("{}:{}", provider.prefix(), model);

        debug!(
            "Creating GenAI gateway: provider={}, model={}",
            provider.name(),
            model,
        );

        Self {
            client: Client::default(),
            model: full_model,
            provider,
            timeout,
        }
    }

    fn build_request(&self, prompt: &ModelPrompt) -> Result<ChatRequest, ModelError> {
        if prompt.is_blank() {
            return Err(ModelError::InvalidRequest("prompt must be non-empty".into()));
        }

        let mut messages = Vec::new();
        if let Some(ref system) = prompt.system {
            messages.push(GenAiChatMessage::system(system));
        }

        match prompt.image {
            Some(ref image) => {
                if image.is_empty() {
                    return Err(ModelError::InvalidRequest(
                        "vision call requires a non-empty image payload".into(),
                    ));
                }
                let parts = vec![
                    ContentPart::from_text(&prompt.user),
                    ContentPart::from_binary_base64(image.media_type.clone(), image.to_base64(), None),
                ];
                messages.push(GenAiChatMessage::user(parts));
            }
            None => messages.push(GenAiChatMessage::user(&prompt.user)),
        }

        Ok(ChatRequest::new(messages))
    }

    fn build_options(&self, prompt: &ModelPrompt) -> ChatOptions {
        let mut options = ChatOptions::default();
        if let Some(temp) = prompt.temperature {
            options = options.with_temperature(temp as f64);
        }
        if let Some(max_tokens) = prompt.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }
        options
    }
}

#[async_trait]
impl ModelGateway for GenAiGateway {
    async fn generate(&self, prompt: ModelPrompt) -> Result<String, ModelError> {
        let request = self.build_request(&prompt)?;
        let options = self.build_options(&prompt);

        let response = match tokio::time::timeout(
            self.timeout,
            self.client.exec_chat(&self.model, request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("{} API error: {}", self.provider.name(), e);
                return Err(ModelError::Provider(format!(
                    "{} request failed: {}",
                    self.provider.name(),
                    e
                )));
            }
            Err(_) => {
                error!(
                    "{} request timed out after {}s",
                    self.provider.name(),
                    self.timeout.as_secs()
                );
                return Err(ModelError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        match response.first_text() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(ModelError::InvalidResponse(
                "model returned no text content".into(),
            )),
        }
    }

    async fn generate_stream(&self, prompt: ModelPrompt) -> Result<ContentStream, ModelError> {
        let request = self.build_request(&prompt)?;
        let options = self.build_options(&prompt);

        // The deadline covers stream establishment; chunk pacing afterwards is
        // governed by the provider.
        let stream_response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat_stream(&self.model, request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("{} stream error: {}", self.provider.name(), e);
                return Err(ModelError::Provider(format!(
                    "{} stream failed: {}",
                    self.provider.name(),
                    e
                )));
            }
            Err(_) => {
                return Err(ModelError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        let fragments = stream_response.stream.filter_map(|event| async move {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => Some(Ok(chunk.content)),
                Ok(_) => None,
                Err(e) => Some(Err(ModelError::Provider(e.to_string()))),
            }
        });

        Ok(fragments.boxed())
    }

    fn name(&self) -> &str {
        self.provider.name()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiGateway")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
