//! Progress reporting and the streaming adapter

mod handler;
mod sse;

pub use handler::{NoOpHandler, PipelineEvent, ProgressHandler};
pub use sse::SseAdapter;
