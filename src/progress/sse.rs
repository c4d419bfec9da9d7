//! Server-Sent-Events adapter over pipeline progress
//!
//! Each pipeline event becomes one newline-terminated frame of the form
//! `data: <JSON>\n\n` pushed into an unbounded channel. The frame `type` is
//! one of `session`, `status`, `content`, `complete`, `error`. Exactly one
//! terminal frame (`complete` or `error`) ends the stream; anything after it
//! is dropped. When the receiving side hangs up the adapter reports
//! cancellation so the pipeline stops pulling further work.

use super::handler::{PipelineEvent, ProgressHandler};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Renders pipeline events as SSE frames into a channel
pub struct SseAdapter {
    sender: UnboundedSender<String>,
    terminal_sent: AtomicBool,
    disconnected: AtomicBool,
}

impl SseAdapter {
    /// Creates an adapter and the receiving end of its frame stream
    pub fn channel() -> (Arc<Self>, UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let adapter = Arc::new(Self {
            sender,
            terminal_sent: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
        });
        (adapter, receiver)
    }

    fn emit(&self, payload: serde_json::Value, terminal: bool) {
        if self.terminal_sent.load(Ordering::SeqCst) {
            debug!("dropping frame after terminal frame");
            return;
        }
        if terminal {
            self.terminal_sent.store(true, Ordering::SeqCst);
        }

        let frame = format!("data: {}\n\n", payload);
        if self.sender.send(frame).is_err() {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }
}

impl ProgressHandler for SseAdapter {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted { session_id } => self.emit(
                json!({"type": "session", "data": {"session_id": session_id}}),
                false,
            ),
            PipelineEvent::StageCompleted { stage } => {
                self.emit(json!({"type": "status", "message": stage}), false)
            }
            PipelineEvent::ContentFragment { text } => {
                self.emit(json!({"type": "content", "content": text}), false)
            }
            PipelineEvent::RunCompleted { session_id } => self.emit(
                json!({"type": "complete", "data": {"session_id": session_id}}),
                true,
            ),
            PipelineEvent::RunFailed { error } => {
                self.emit(json!({"type": "error", "message": error}), true)
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}
