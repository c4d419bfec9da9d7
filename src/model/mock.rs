use super::error::ModelError;
use super::gateway::{ContentStream, ModelGateway};
use super::types::ModelPrompt;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted reply for [`MockGateway`]
#[derive(Debug, Clone)]
pub struct MockReply {
    pub content: String,
    pub fragments: Option<Vec<String>>,
    pub error: Option<ModelError>,
}

impl MockReply {
    /// Reply with plain text content
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            fragments: None,
            error: None,
        }
    }

    /// Reply whose streaming variant yields the given fragments in order
    pub fn fragments(fragments: Vec<&str>) -> Self {
        let fragments: Vec<String> = fragments.into_iter().map(String::from).collect();
        Self {
            content: fragments.concat(),
            fragments: Some(fragments),
            error: None,
        }
    }

    /// Reply that fails with the given error
    pub fn error(error: ModelError) -> Self {
        Self {
            content: String::new(),
            fragments: None,
            error: Some(error),
        }
    }
}

/// In-memory gateway returning scripted replies in FIFO order
///
/// Used throughout the test suites in place of a live provider.
pub struct MockGateway {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    name: String,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            name: "MockModel".to_string(),
        }
    }

    pub fn add_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn add_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        let mut queue = self.replies.lock().unwrap();
        for reply in replies {
            queue.push_back(reply);
        }
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    /// Number of invocations served so far, including failures
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Result<MockReply, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Provider("MockGateway: reply queue exhausted".into()))?;

        if let Some(error) = reply.error.clone() {
            return Err(error);
        }
        Ok(reply)
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    async fn generate(&self, _prompt: ModelPrompt) -> Result<String, ModelError> {
        self.next_reply().map(|reply| reply.content)
    }

    async fn generate_stream(&self, _prompt: ModelPrompt) -> Result<ContentStream, ModelError> {
        let reply = self.next_reply()?;
        let fragments = reply
            .fragments
            .unwrap_or_else(|| vec![reply.content.clone()]);
        Ok(futures_util::stream::iter(fragments.into_iter().map(Ok)).boxed())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("name", &self.name)
            .field("remaining_replies", &self.remaining_replies())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_mock_gateway_basic() {
        let gateway = MockGateway::new();
        gateway.add_reply(MockReply::text("Hello!"));

        let content = gateway.generate(ModelPrompt::new("hi")).await.unwrap();
        assert_eq!(content, "Hello!");
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_gateway_fifo_order() {
        let gateway = MockGateway::new();
        gateway.add_replies(vec![MockReply::text("first"), MockReply::text("second")]);

        assert_eq!(gateway.remaining_replies(), 2);
        let first = gateway.generate(ModelPrompt::new("a")).await.unwrap();
        let second = gateway.generate(ModelPrompt::new("b")).await.unwrap();
        assert_eq!(first, "first");
        assert_eq!(second, "second");
        assert_eq!(gateway.remaining_replies(), 0);
    }

    #[tokio::test]
    async fn test_mock_gateway_error() {
        let gateway = MockGateway::new();
        gateway.add_reply(MockReply::error(ModelError::Timeout { seconds: 30 }));

        let result = gateway.generate(ModelPrompt::new("hi")).await;
        assert!(matches!(result, Err(ModelError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_mock_gateway_exhausted() {
        let gateway = MockGateway::new();
        let result = gateway.generate(ModelPrompt::new("hi")).await;
        assert!(matches!(result, Err(ModelError::Provider(_))));
    }

    #[tokio::test]
    async fn test_mock_gateway_stream_fragments() {
        let gateway = MockGateway::new();
        gateway.add_reply(MockReply::fragments(vec!["eat ", "more ", "greens"]));

        let stream = gateway
            .generate_stream(ModelPrompt::new("advise"))
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments, vec!["eat ", "more ", "greens"]);
    }
}
