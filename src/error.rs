//! Error types for promptkernel
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Boxed error returned by plugin functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All error types that can occur while parsing, rendering or invoking prompts
#[derive(Debug, Error)]
pub enum KernelError {
    /// An opening `{{` has no matching `}}`
    #[error("Unterminated expression starting at byte {offset}")]
    UnterminatedExpression { offset: usize },

    /// A second `{{` was found before the current expression was closed
    #[error("Nested expression not allowed at byte {offset}")]
    NestedExpressionNotAllowed { offset: usize },

    /// The expression between the delimiters is malformed
    #[error("Invalid expression at byte {offset}: {reason}")]
    InvalidExpression { offset: usize, reason: String },

    /// No function registered under `plugin.function`
    #[error("Unknown plugin function: {plugin}.{function}")]
    UnknownPluginFunction { plugin: String, function: String },

    /// A plugin function ran and failed
    #[error("Plugin function {plugin}.{function} failed: {source}")]
    PluginInvocation {
        plugin: String,
        function: String,
        #[source]
        source: BoxError,
    },

    /// A bare variable reference had no matching argument
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// A required configuration value is absent
    #[error("Missing configuration: {0} is not set")]
    MissingConfiguration(String),

    /// Completion backend failure (transport, quota, bad response)
    #[error("Backend error: {0}")]
    Backend(String),

    /// No completion service registered under the requested id
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// No prompt function registered under `plugin.function`
    #[error("Function not found: {plugin}.{function}")]
    FunctionNotFound { plugin: String, function: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KernelError {
    /// True for errors raised while parsing a template
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            KernelError::UnterminatedExpression { .. }
                | KernelError::NestedExpressionNotAllowed { .. }
                | KernelError::InvalidExpression { .. }
        )
    }
}

/// Result type alias for promptkernel operations
pub type Result<T> = std::result::Result<T, KernelError>;
