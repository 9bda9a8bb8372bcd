//! Plugin registry - lookup of plugin functions by `(plugin, function)` name

use std::collections::HashMap;
use std::sync::Arc;

use super::function::{Plugin, PluginFunction};

/// Registered plugin functions keyed by plugin name, then function name
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, HashMap<String, Arc<dyn PluginFunction>>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin's functions under `name`
    ///
    /// Functions are merged into an existing plugin of the same name; a
    /// function with an existing name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, plugin: &impl Plugin) {
        let name = name.into();
        let functions = plugin.functions();
        log::info!("Registering plugin '{}' with {} functions", name, functions.len());
        self.plugins.entry(name).or_default().extend(functions);
    }

    /// Register a single function
    pub fn register_function(
        &mut self,
        plugin: impl Into<String>,
        function: impl Into<String>,
        func: Arc<dyn PluginFunction>,
    ) {
        self.plugins
            .entry(plugin.into())
            .or_default()
            .insert(function.into(), func);
    }

    /// Look up `plugin.function`
    pub fn resolve(&self, plugin: &str, function: &str) -> Option<Arc<dyn PluginFunction>> {
        self.plugins.get(plugin).and_then(|f| f.get(function)).cloned()
    }

    /// Check whether a plugin is registered
    pub fn contains_plugin(&self, plugin: &str) -> bool {
        self.plugins.contains_key(plugin)
    }

    /// All registered `(plugin, function)` names, sorted
    pub fn list(&self) -> Vec<(String, String)> {
        let mut names: Vec<(String, String)> = self
            .plugins
            .iter()
            .flat_map(|(plugin, functions)| functions.keys().map(move |f| (plugin.clone(), f.clone())))
            .collect();
        names.sort();
        names
    }

    /// Number of registered functions across all plugins
    pub fn len(&self) -> usize {
        self.plugins.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("functions", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelArguments;
    use crate::plugins::function;

    fn constant(value: &'static str) -> Arc<dyn PluginFunction> {
        function("constant", move |_: &KernelArguments| Ok(value.to_string()))
    }

    fn sample_plugin() -> HashMap<String, Arc<dyn PluginFunction>> {
        let mut functions = HashMap::new();
        functions.insert("date".to_string(), constant("Monday"));
        functions.insert("time".to_string(), constant("09:00"));
        functions
    }

    #[test]
    fn test_empty_registry() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.resolve("time", "date").is_none());
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let mut registry = PluginRegistry::new();
        registry.register("time", &sample_plugin());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains_plugin("time"));
        let date = registry.resolve("time", "date").unwrap();
        assert_eq!(date.invoke(&KernelArguments::new()).await.unwrap(), "Monday");
        assert!(registry.resolve("time", "bogus").is_none());
        assert!(registry.resolve("clock", "date").is_none());
    }

    #[tokio::test]
    async fn test_register_merges_and_replaces() {
        let mut registry = PluginRegistry::new();
        registry.register("time", &sample_plugin());
        registry.register_function("time", "date", constant("Tuesday"));
        registry.register_function("time", "year", constant("2026"));

        assert_eq!(registry.len(), 3);
        let date = registry.resolve("time", "date").unwrap();
        assert_eq!(date.invoke(&KernelArguments::new()).await.unwrap(), "Tuesday");
    }

    #[test]
    fn test_list_sorted() {
        let mut registry = PluginRegistry::new();
        registry.register("time", &sample_plugin());
        registry.register_function("math", "add", constant("0"));

        let names = registry.list();
        assert_eq!(
            names,
            vec![
                ("math".to_string(), "add".to_string()),
                ("time".to_string(), "date".to_string()),
                ("time".to_string(), "time".to_string()),
            ]
        );
    }
}
