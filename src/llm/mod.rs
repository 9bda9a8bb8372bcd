//! LLM Client Layer - chat-completion backends
//!
//! This module provides:
//! - Message types for completion requests
//! - ChatCompletion trait for backend abstraction
//! - AzureChatClient implementation
//! - MockChatClient for tests

pub mod azure;
pub mod client;
pub mod types;

pub use azure::{AzureChatClient, AzureConfig};
pub use client::{ChatCompletion, MockChatClient};
pub use types::{CompletionRequest, CompletionResponse, FinishReason, Message, Role, Usage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _role = Role::User;
        let _reason = FinishReason::Stop;
    }
}
