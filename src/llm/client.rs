//! Chat-completion client trait and a mock implementation

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{KernelError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// Stateless completion backend - each call is independent
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Single completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model or deployment this client targets
    fn model(&self) -> &str;
}

/// Scripted client for tests
///
/// Replies are served in the order they were queued; once the queue is empty
/// every call returns the default reply.
#[derive(Debug)]
pub struct MockChatClient {
    replies: Mutex<VecDeque<std::result::Result<CompletionResponse, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    default_reply: String,
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_reply: "mock response".to_string(),
        }
    }

    /// Queue a successful reply
    pub fn with_reply(self, response: CompletionResponse) -> Self {
        self.lock_replies().push_back(Ok(response));
        self
    }

    /// Queue a successful text reply
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.with_reply(CompletionResponse::text(content))
    }

    /// Queue a backend failure
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.lock_replies().push_back(Err(message.into()));
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<std::result::Result<CompletionResponse, String>>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatCompletion for MockChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        match self.lock_replies().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(KernelError::Backend(message)),
            None => Ok(CompletionResponse::text(self.default_reply.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
