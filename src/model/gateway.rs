use super::error::ModelError;
use super::types::ModelPrompt;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::de::DeserializeOwned;

/// Stream of incremental content fragments in model-output order
pub type ContentStream = BoxStream<'static, Result<String, ModelError>>;

/// Uniform capability to invoke a vision- or analysis-capable model
///
/// The gateway performs exactly one outbound call per invocation and never
/// retries; retry policy lives with the caller (see [`super::RetryingGateway`]).
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Sends the prompt and returns the full response content
    async fn generate(&self, prompt: ModelPrompt) -> Result<String, ModelError>;

    /// Sends the prompt and returns content as an incremental stream
    async fn generate_stream(&self, prompt: ModelPrompt) -> Result<ContentStream, ModelError>;

    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }
}

/// Invokes the gateway and decodes the reply into a typed value
///
/// The prompt is expected to instruct the model to answer with JSON matching
/// `T`. Providers routinely wrap JSON in markdown fences or preamble text, so
/// the reply is scanned for its outermost JSON object before decoding.
pub async fn generate_structured<T: DeserializeOwned>(
    gateway: &dyn ModelGateway,
    prompt: ModelPrompt,
) -> Result<T, ModelError> {
    let content = gateway.generate(prompt).await?;
    decode_json_reply(&content)
}

/// Extracts and decodes the outermost JSON object in a model reply
pub fn decode_json_reply<T: DeserializeOwned>(content: &str) -> Result<T, ModelError> {
    let candidate = extract_json_object(content).ok_or_else(|| {
        ModelError::InvalidResponse(format!(
            "no JSON object found in reply ({} chars)",
            content.len()
        ))
    })?;

    serde_json::from_str(candidate)
        .map_err(|e| ModelError::InvalidResponse(format!("JSON decode failed: {}", e)))
}

fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}
