//! Template renderer - resolve references and concatenate the result
//!
//! Segments are resolved strictly left to right. Plugin references are looked
//! up in the registry and invoked with the render's argument set; variable
//! references read the argument set directly. Any failure aborts the render
//! and no partial output is returned.

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::kernel::KernelArguments;
use crate::plugins::PluginRegistry;

use super::segment::{Reference, Segment, Template};

/// What to do with a variable reference that has no argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedPolicy {
    /// Substitute an empty string
    Empty,
    /// Fail with `UndefinedVariable`
    #[default]
    Error,
}

/// Renders parsed templates against a registry and an argument set
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    on_undefined: UndefinedPolicy,
}

impl Renderer {
    pub fn new(on_undefined: UndefinedPolicy) -> Self {
        Self { on_undefined }
    }

    /// Render a parsed template
    pub async fn render(
        &self,
        template: &Template,
        registry: &PluginRegistry,
        arguments: &KernelArguments,
    ) -> Result<String> {
        self.render_segments(template.segments(), registry, arguments).await
    }

    /// Parse and render template text in one step
    pub async fn render_text(
        &self,
        text: &str,
        registry: &PluginRegistry,
        arguments: &KernelArguments,
    ) -> Result<String> {
        let template = Template::parse(text)?;
        self.render(&template, registry, arguments).await
    }

    /// Render a segment sequence
    pub async fn render_segments(
        &self,
        segments: &[Segment],
        registry: &PluginRegistry,
        arguments: &KernelArguments,
    ) -> Result<String> {
        let mut output = String::new();

        for segment in segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Reference(reference) => {
                    let value = self.resolve(reference, registry, arguments).await?;
                    output.push_str(&value);
                }
            }
        }

        Ok(output)
    }

    async fn resolve(
        &self,
        reference: &Reference,
        registry: &PluginRegistry,
        arguments: &KernelArguments,
    ) -> Result<String> {
        let Some(plugin) = reference.plugin.as_deref() else {
            return self.resolve_variable(&reference.name, arguments);
        };

        let function = registry.resolve(plugin, &reference.name).ok_or_else(|| {
            KernelError::UnknownPluginFunction {
                plugin: plugin.to_string(),
                function: reference.name.clone(),
            }
        })?;

        log::debug!("Invoking plugin function {}", reference);
        function
            .invoke(arguments)
            .await
            .map_err(|source| KernelError::PluginInvocation {
                plugin: plugin.to_string(),
                function: reference.name.clone(),
                source,
            })
    }

    fn resolve_variable(&self, name: &str, arguments: &KernelArguments) -> Result<String> {
        match (arguments.get(name), self.on_undefined) {
            (Some(value), _) => Ok(value.to_string()),
            (None, UndefinedPolicy::Empty) => {
                log::warn!("Variable '{}' is undefined, substituting empty string", name);
                Ok(String::new())
            }
            (None, UndefinedPolicy::Error) => Err(KernelError::UndefinedVariable(name.to_string())),
        }
    }
}
