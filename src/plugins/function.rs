//! Plugin function abstraction
//!
//! A plugin is a named group of functions. Each function takes the argument
//! set of the current render and produces a string.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::kernel::KernelArguments;

/// A function callable from a template as `{{plugin.function}}`
#[async_trait]
pub trait PluginFunction: Send + Sync {
    /// Invoke the function with the arguments of the current render
    async fn invoke(&self, arguments: &KernelArguments) -> Result<String, BoxError>;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }
}

/// Adapter turning a synchronous closure into a `PluginFunction`
pub struct FnFunction<F> {
    description: String,
    func: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&KernelArguments) -> Result<String, BoxError> + Send + Sync,
{
    pub fn new(description: impl Into<String>, func: F) -> Self {
        Self {
            description: description.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> PluginFunction for FnFunction<F>
where
    F: Fn(&KernelArguments) -> Result<String, BoxError> + Send + Sync,
{
    async fn invoke(&self, arguments: &KernelArguments) -> Result<String, BoxError> {
        (self.func)(arguments)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Wrap a closure as a shared plugin function
pub fn function<F>(description: impl Into<String>, func: F) -> Arc<dyn PluginFunction>
where
    F: Fn(&KernelArguments) -> Result<String, BoxError> + Send + Sync + 'static,
{
    Arc::new(FnFunction::new(description, func))
}

/// A group of functions registered together under one plugin name
pub trait Plugin {
    /// The functions this plugin exposes, keyed by function name
    fn functions(&self) -> HashMap<String, Arc<dyn PluginFunction>>;
}

impl Plugin for HashMap<String, Arc<dyn PluginFunction>> {
    fn functions(&self) -> HashMap<String, Arc<dyn PluginFunction>> {
        self.clone()
    }
}
