//! Progress handler trait and events

/// Events emitted while a pipeline run advances
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Run started; carries the correlation identifier
    RunStarted { session_id: String },

    /// A non-terminal stage completed
    StageCompleted { stage: String },

    /// Incremental model-output fragment, in model-output order
    ContentFragment { text: String },

    /// Run reached its completed state
    RunCompleted { session_id: String },

    /// Run failed
    RunFailed { error: String },
}

/// Trait for observing pipeline progress
///
/// Handlers are invoked inline between stages, so events arrive strictly in
/// pipeline-stage order.
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_event(&self, event: &PipelineEvent);

    /// Whether the consumer has gone away; the pipeline stops before its
    /// next stage when this turns true
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_event(&self, _event: &PipelineEvent) {
        // Intentionally empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_event(&self, _event: &PipelineEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_event(&PipelineEvent::RunStarted {
            session_id: "s1".to_string(),
        });
        assert!(!handler.is_cancelled());
    }

    #[test]
    fn test_events_reach_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_event(&PipelineEvent::RunStarted {
            session_id: "s1".to_string(),
        });
        handler.on_event(&PipelineEvent::StageCompleted {
            stage: "image_analyzed".to_string(),
        });
        handler.on_event(&PipelineEvent::RunCompleted {
            session_id: "s1".to_string(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
