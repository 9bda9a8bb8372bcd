//! Prompt functions and their results

use std::fmt;

use crate::error::Result;
use crate::llm::{FinishReason, Usage};
use crate::template::Template;

use super::settings::PromptExecutionSettings;

/// A named prompt template bound to execution settings
#[derive(Debug, Clone)]
pub struct PromptFunction {
    pub plugin_name: String,
    pub name: String,
    pub template: Template,
    pub settings: PromptExecutionSettings,
}

impl PromptFunction {
    /// Create a prompt function, parsing the template immediately
    pub fn new(
        plugin_name: impl Into<String>,
        name: impl Into<String>,
        template: &str,
        settings: PromptExecutionSettings,
    ) -> Result<Self> {
        Ok(Self::from_template(plugin_name, name, Template::parse(template)?, settings))
    }

    pub fn from_template(
        plugin_name: impl Into<String>,
        name: impl Into<String>,
        template: Template,
        settings: PromptExecutionSettings,
    ) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            name: name.into(),
            template,
            settings,
        }
    }

    /// `plugin.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.plugin_name, self.name)
    }
}

/// Outcome of invoking a prompt function
#[derive(Debug, Clone)]
pub struct FunctionResult {
    pub function: String,
    pub rendered_prompt: String,
    pub value: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl fmt::Display for FunctionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
