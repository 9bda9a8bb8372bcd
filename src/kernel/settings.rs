//! Execution settings forwarded to the completion backend

use serde::{Deserialize, Serialize};

use crate::llm::CompletionRequest;

/// Options for one backend invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptExecutionSettings {
    /// Target service id, `None` selects the kernel's default service
    pub service_id: Option<String>,
    /// Maximum number of output tokens
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl PromptExecutionSettings {
    pub fn for_service(service_id: impl Into<String>) -> Self {
        Self {
            service_id: Some(service_id.into()),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the backend request for a rendered prompt
    pub fn to_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..CompletionRequest::from_prompt(prompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let settings = PromptExecutionSettings::for_service("template_language").with_max_tokens(100);
        assert_eq!(settings.service_id.as_deref(), Some("template_language"));
        assert_eq!(settings.max_tokens, Some(100));
        assert_eq!(settings.temperature, None);
    }

    #[test]
    fn test_to_request() {
        let settings = PromptExecutionSettings::default().with_max_tokens(50).with_temperature(0.5);
        let request = settings.to_request("Is it morning?");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "Is it morning?");
        assert_eq!(request.max_tokens, Some(50));
        assert_eq!(request.temperature, Some(0.5));
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: PromptExecutionSettings = serde_yaml::from_str("max_tokens: 100").unwrap();
        assert_eq!(settings.max_tokens, Some(100));
        assert!(settings.service_id.is_none());
    }
}
