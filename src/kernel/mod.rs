//! Kernel - wires plugins, completion services and prompt functions together
//!
//! The kernel owns the plugin registry used for rendering, the completion
//! services prompts are sent to, and the prompt functions defined on it.
//! Invoking a prompt function renders its template and forwards the result
//! to the selected service unchanged.

mod arguments;
mod function;
mod settings;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{KernelError, Result};
use crate::llm::{ChatCompletion, CompletionResponse};
use crate::plugins::{Plugin, PluginRegistry};
use crate::template::{Renderer, Template, UndefinedPolicy};

pub use arguments::KernelArguments;
pub use function::{FunctionResult, PromptFunction};
pub use settings::PromptExecutionSettings;

#[derive(Default)]
pub struct Kernel {
    plugins: PluginRegistry,
    services: HashMap<String, Arc<dyn ChatCompletion>>,
    default_service: Option<String>,
    functions: HashMap<(String, String), Arc<PromptFunction>>,
    renderer: Renderer,
}

impl Kernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how undefined variables are rendered
    pub fn with_undefined_policy(mut self, policy: UndefinedPolicy) -> Self {
        self.renderer = Renderer::new(policy);
        self
    }

    /// Register a completion service; the first one added becomes the default
    pub fn add_service(&mut self, service_id: impl Into<String>, service: Arc<dyn ChatCompletion>) {
        let service_id = service_id.into();
        log::info!("Adding service '{}' (model: {})", service_id, service.model());
        if self.default_service.is_none() {
            self.default_service = Some(service_id.clone());
        }
        self.services.insert(service_id, service);
    }

    /// Look up a service by id, or the default service when `None`
    pub fn service(&self, service_id: Option<&str>) -> Result<Arc<dyn ChatCompletion>> {
        let id = service_id
            .or(self.default_service.as_deref())
            .ok_or_else(|| KernelError::ServiceNotFound("<default>".to_string()))?;
        self.services
            .get(id)
            .cloned()
            .ok_or_else(|| KernelError::ServiceNotFound(id.to_string()))
    }

    /// Register a plugin's functions under `name`
    pub fn add_plugin(&mut self, name: impl Into<String>, plugin: &impl Plugin) {
        self.plugins.register(name, plugin);
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Define a prompt function; the template is parsed here
    pub fn add_function(
        &mut self,
        plugin_name: &str,
        function_name: &str,
        template: &str,
        settings: PromptExecutionSettings,
    ) -> Result<Arc<PromptFunction>> {
        let function = Arc::new(PromptFunction::new(plugin_name, function_name, template, settings)?);
        self.functions.insert(
            (plugin_name.to_string(), function_name.to_string()),
            Arc::clone(&function),
        );
        log::info!("Added prompt function {}", function.qualified_name());
        Ok(function)
    }

    /// Look up a prompt function
    pub fn function(&self, plugin_name: &str, function_name: &str) -> Result<Arc<PromptFunction>> {
        self.functions
            .get(&(plugin_name.to_string(), function_name.to_string()))
            .cloned()
            .ok_or_else(|| KernelError::FunctionNotFound {
                plugin: plugin_name.to_string(),
                function: function_name.to_string(),
            })
    }

    /// Render a parsed template against the kernel's plugins
    pub async fn render(&self, template: &Template, arguments: &KernelArguments) -> Result<String> {
        self.renderer.render(template, &self.plugins, arguments).await
    }

    /// Parse and render template text
    pub async fn render_text(&self, text: &str, arguments: &KernelArguments) -> Result<String> {
        self.renderer.render_text(text, &self.plugins, arguments).await
    }

    /// Send an already rendered prompt to the selected service
    pub async fn invoke_prompt(
        &self,
        rendered_prompt: &str,
        settings: &PromptExecutionSettings,
    ) -> Result<CompletionResponse> {
        let service = self.service(settings.service_id.as_deref())?;
        service.complete(settings.to_request(rendered_prompt)).await
    }

    /// Render a prompt function's template and invoke the backend with it
    pub async fn invoke(
        &self,
        function: &PromptFunction,
        arguments: &KernelArguments,
    ) -> Result<FunctionResult> {
        log::info!("Invoking {}", function.qualified_name());
        let rendered_prompt = self.render(&function.template, arguments).await?;
        let response = self.invoke_prompt(&rendered_prompt, &function.settings).await?;
        log::info!(
            "{} completed: {} tokens ({:?})",
            function.qualified_name(),
            response.usage.total(),
            response.finish_reason
        );

        Ok(FunctionResult {
            function: function.qualified_name(),
            rendered_prompt,
            value: response.content,
            finish_reason: response.finish_reason,
            usage: response.usage,
        })
    }

    /// Invoke a prompt function by name
    pub async fn invoke_by_name(
        &self,
        plugin_name: &str,
        function_name: &str,
        arguments: &KernelArguments,
    ) -> Result<FunctionResult> {
        let function = self.function(plugin_name, function_name)?;
        self.invoke(&function, arguments).await
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut services: Vec<&String> = self.services.keys().collect();
        services.sort();
        f.debug_struct("Kernel")
            .field("plugins", &self.plugins)
            .field("services", &services)
            .field("default_service", &self.default_service)
            .field("functions", &self.functions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatClient;
    use crate::plugins::function;

    fn kernel_with(client: Arc<MockChatClient>) -> Kernel {
        let mut kernel = Kernel::new();
        kernel.add_service("template_language", client);
        kernel.add_plugin("time", &{
            let mut functions = HashMap::new();
            functions.insert(
                "date".to_string(),
                function("", |_: &KernelArguments| Ok("Monday".to_string())),
            );
            functions
        });
        kernel
    }

    #[test]
    fn test_service_lookup() {
        let mut kernel = Kernel::new();
        assert!(matches!(kernel.service(None), Err(KernelError::ServiceNotFound(_))));

        kernel.add_service("first", Arc::new(MockChatClient::new()));
        kernel.add_service("second", Arc::new(MockChatClient::new()));

        assert!(kernel.service(None).is_ok());
        assert!(kernel.service(Some("second")).is_ok());
        let err = kernel.service(Some("third")).err().unwrap();
        assert!(matches!(err, KernelError::ServiceNotFound(ref id) if id == "third"));
    }

    #[tokio::test]
    async fn test_invoke_renders_then_calls_backend() {
        let client = Arc::new(MockChatClient::new().with_text("weekday"));
        let mut kernel = kernel_with(Arc::clone(&client));

        let function = kernel
            .add_function(
                "TimePlugin",
                "kind_of_day",
                "Today is {{time.date}}. Weekend?",
                PromptExecutionSettings::for_service("template_language").with_max_tokens(100),
            )
            .unwrap();

        let result = kernel.invoke(&function, &KernelArguments::new()).await.unwrap();
        assert_eq!(result.value, "weekday");
        assert_eq!(result.rendered_prompt, "Today is Monday. Weekend?");
        assert_eq!(result.function, "TimePlugin.kind_of_day");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "Today is Monday. Weekend?");
        assert_eq!(requests[0].max_tokens, Some(100));
    }

    #[tokio::test]
    async fn test_invoke_render_failure_skips_backend() {
        let client = Arc::new(MockChatClient::new());
        let mut kernel = kernel_with(Arc::clone(&client));
        kernel
            .add_function("p", "f", "{{time.bogus}}", PromptExecutionSettings::default())
            .unwrap();

        let err = kernel
            .invoke_by_name("p", "f", &KernelArguments::new())
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::UnknownPluginFunction { .. }));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_backend_error_propagates() {
        let client = Arc::new(MockChatClient::new().with_error("quota exceeded"));
        let mut kernel = kernel_with(client);
        let function = kernel
            .add_function("p", "f", "hello", PromptExecutionSettings::default())
            .unwrap();

        let err = kernel.invoke(&function, &KernelArguments::new()).await.unwrap_err();
        assert!(matches!(err, KernelError::Backend(_)));
    }

    #[test]
    fn test_add_function_rejects_bad_template() {
        let mut kernel = Kernel::new();
        let err = kernel
            .add_function("p", "f", "{{a{{b}}}}", PromptExecutionSettings::default())
            .unwrap_err();
        assert!(matches!(err, KernelError::NestedExpressionNotAllowed { .. }));
        assert!(matches!(kernel.function("p", "f"), Err(KernelError::FunctionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_undefined_policy() {
        let kernel = Kernel::new().with_undefined_policy(UndefinedPolicy::Empty);
        let rendered = kernel.render_text("[{{missing}}]", &KernelArguments::new()).await.unwrap();
        assert_eq!(rendered, "[]");

        let strict = Kernel::new();
        assert!(strict.render_text("[{{missing}}]", &KernelArguments::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_invoke_prompt_is_pass_through() {
        let client = Arc::new(MockChatClient::new().with_text("  raw  output \n"));
        let kernel = kernel_with(client);
        let response = kernel
            .invoke_prompt("prompt", &PromptExecutionSettings::default())
            .await
            .unwrap();
        assert_eq!(response.content, "  raw  output \n");
    }
}
