//! Azure OpenAI chat-completion client
//!
//! This module implements the ChatCompletion trait for an Azure OpenAI
//! deployment. Credentials come from the environment, read once at startup.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{KernelError, Result};
use crate::llm::client::ChatCompletion;
use crate::llm::types::{CompletionRequest, CompletionResponse, FinishReason, Usage};

/// Environment variable holding the chat deployment name
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_CHAT_DEPLOYMENT_NAME";

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";

/// Environment variable holding the resource endpoint, e.g. `https://<name>.openai.azure.com`
pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";

/// Optional environment variable overriding the API version
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";

/// Default REST API version
const DEFAULT_API_VERSION: &str = "2024-06-01";

/// Configuration for the Azure client
#[derive(Clone)]
pub struct AzureConfig {
    pub deployment: String,
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl AzureConfig {
    /// Read configuration from process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through a lookup function
    ///
    /// Fails with `MissingConfiguration` naming the first required variable
    /// that is absent or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| KernelError::MissingConfiguration(name.to_string()))
        };

        let deployment = required(ENV_DEPLOYMENT)?;
        let api_key = required(ENV_API_KEY)?;
        let endpoint = required(ENV_ENDPOINT)?;
        let api_version = lookup(ENV_API_VERSION)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            deployment,
            api_key,
            endpoint,
            api_version,
            timeout: Duration::from_secs(300),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full chat-completions URL for this deployment
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("deployment", &self.deployment)
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Azure OpenAI chat client
pub struct AzureChatClient {
    client: Client,
    config: AzureConfig,
    usage: Arc<Mutex<Usage>>,
}

impl AzureChatClient {
    /// Create a new client from explicit configuration
    pub fn new(config: AzureConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| KernelError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    /// Create a client from environment configuration
    pub fn from_env() -> Result<Self> {
        Self::new(AzureConfig::from_env()?)
    }

    /// Build the request body for the chat-completions API
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        let mut body = json!({ "messages": messages });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }

    /// Parse the API response into a CompletionResponse
    fn parse_response(&self, body: Value) -> Result<CompletionResponse> {
        let choice = body["choices"]
            .get(0)
            .ok_or_else(|| KernelError::Backend("Response contained no choices".to_string()))?;

        let finish_reason = choice["finish_reason"]
            .as_str()
            .map(FinishReason::from_wire)
            .unwrap_or_default();
        // Content-filtered replies carry a null message content
        let content = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                KernelError::Backend(format!("Response contained no message content (finish reason: {:?})", finish_reason))
            })?
            .to_string();

        let usage = body
            .get("usage")
            .map(|u| {
                Usage::new(
                    u["prompt_tokens"].as_u64().unwrap_or(0),
                    u["completion_tokens"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        self.usage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .add(&usage);

        Ok(CompletionResponse {
            content,
            finish_reason,
            usage,
            model: body["model"].as_str().map(str::to_string),
        })
    }

    /// Send a request to the deployment
    async fn send_request(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| KernelError::Backend(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(KernelError::Backend(format!(
                "Rate limited, retry after {} seconds",
                retry_after
            )));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KernelError::Backend(format!("API error {}: {}", status, error_body)));
        }

        response
            .json()
            .await
            .map_err(|e| KernelError::Backend(format!("Failed to parse response: {}", e)))
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        *self.usage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatCompletion for AzureChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request);
        log::debug!("Sending completion request to deployment {}", self.config.deployment);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.deployment
    }
}

impl std::fmt::Debug for AzureChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureChatClient")
            .field("deployment", &self.config.deployment)
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}
