//! Model request/response types
//!
//! These types describe a single model invocation independent of any
//! provider implementation.

use serde::{Deserialize, Serialize};

/// Image payload attached to a vision request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Declared media type, e.g. "image/jpeg"
    pub media_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Returns the payload encoded as base64 for providers that require it
    pub fn to_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        STANDARD.encode(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single prompt to send to the model
#[derive(Debug, Clone)]
pub struct ModelPrompt {
    /// System instructions
    pub system: Option<String>,
    /// User content
    pub user: String,
    /// Image payload for vision calls
    pub image: Option<ImagePayload>,
    /// Temperature for response generation (0.0 - 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ModelPrompt {
    /// Creates a prompt with user content only
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            image: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sets the system instructions
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Attaches an image payload
    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    /// Sets the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Returns true if the user content is blank
    pub fn is_blank(&self) -> bool {
        self.user.trim().is_empty()
    }
}
