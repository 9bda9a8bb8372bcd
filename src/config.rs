use eyre::{Context, Result};
use promptkernel::PromptExecutionSettings;
use promptkernel::template::UndefinedPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub template: TemplateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub service_id: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            service_id: "template_language".to_string(),
            max_tokens: 100,
            temperature: None,
            timeout_ms: 300000,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn execution_settings(&self) -> PromptExecutionSettings {
        PromptExecutionSettings {
            service_id: Some(self.service_id.clone()),
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub on_undefined: UndefinedPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            template: TemplateConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let loaded = Self::load_first_valid(&Self::candidate_paths(), |path, e| {
            log::warn!("Failed to load config from {}: {:?}", path.display(), e);
        });

        Ok(loaded.unwrap_or_else(|| {
            // No usable config file found, use defaults
            log::info!("No config file found, using defaults");
            Self::default()
        }))
    }

    /// Primary location `~/.config/<project>/<project>.yml`, then `./<project>.yml`
    fn candidate_paths() -> Vec<PathBuf> {
        let project_name = env!("CARGO_PKG_NAME");
        let file_name = format!("{}.yml", project_name);

        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(&file_name));
        }
        candidates.push(PathBuf::from(file_name));
        candidates
    }

    /// First candidate that exists and parses; broken files are reported through `on_skip`
    fn load_first_valid<F>(candidates: &[PathBuf], mut on_skip: F) -> Option<Self>
    where
        F: FnMut(&Path, &eyre::Report),
    {
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return Some(config),
                Err(e) => on_skip(path, &e),
            }
        }
        None
    }

    /// Configured log level, if it names a valid `log` level
    pub fn log_level_filter(&self) -> Option<log::LevelFilter> {
        self.log_level.as_deref().and_then(|level| level.trim().parse().ok())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
