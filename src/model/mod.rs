//! Model gateway abstraction layer
//!
//! This module provides a trait-based abstraction for invoking vision- or
//! analysis-capable language models, allowing different backends (GenAI,
//! Mock) to be used interchangeably.

mod error;
mod gateway;
mod genai;
mod mock;
mod retry;
mod types;

pub use error::ModelError;
pub use gateway::{decode_json_reply, generate_structured, ContentStream, ModelGateway};
pub use self::genai::{GenAiGateway, Provider};
pub use mock::{MockGateway, MockReply};
pub use retry::{RetryPolicy, RetryingGateway};
pub use types::{ImagePayload, ModelPrompt};
