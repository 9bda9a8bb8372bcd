use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::{LevelFilter, info};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use promptkernel::kernel::FunctionResult;
use promptkernel::llm::{AzureChatClient, AzureConfig};
use promptkernel::plugins::TimePlugin;
use promptkernel::{Kernel, KernelArguments, PromptExecutionSettings};

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, TemplateInput};
use config::Config;

const KIND_OF_DAY: &str = "
    Today is: {{time.date}}
    Current time is: {{time.time}}

    Answer to the following questions using JSON syntax, including the data used.
    Is it morning, afternoon, evening, or night (morning/afternoon/evening/night)?
    Is it weekend time (weekend/not weekend)?
    ";

/// Crate logs pass the filter at every level; `log_level` from config caps them later
const DEFAULT_LOG_FILTER: &str = "warn,promptkernel=trace";

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptkernel")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("promptkernel.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .target(env_logger::Target::Pipe(target))
        .init();

    if !rust_log_set() {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn rust_log_set() -> bool {
    std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some()
}

/// Apply the configured level unless RUST_LOG already decided it
fn apply_log_level(config: &Config) {
    if rust_log_set() {
        return;
    }
    match (config.log_level_filter(), config.log_level.as_deref()) {
        (Some(level), _) => log::set_max_level(level),
        (None, Some(raw)) => log::warn!("Unknown log_level '{}', keeping info", raw),
        (None, None) => {}
    }
}

/// Build a kernel with the time plugin and the configured undefined-variable policy
fn build_kernel(config: &Config) -> Kernel {
    let mut kernel = Kernel::new().with_undefined_policy(config.template.on_undefined);
    kernel.add_plugin("time", &TimePlugin::new());
    kernel
}

/// Register the Azure deployment from the environment under `service_id`
fn add_azure_service(kernel: &mut Kernel, config: &Config, service_id: &str) -> Result<()> {
    let azure = AzureConfig::from_env()
        .context("Azure OpenAI credentials are incomplete")?
        .with_timeout(config.llm.timeout());
    let client = AzureChatClient::new(azure)?;
    kernel.add_service(service_id, Arc::new(client));
    Ok(())
}

/// Execution settings for `invoke`, with command-line overrides applied
fn invoke_settings(config: &Config, max_tokens: Option<u32>, service: Option<&str>) -> PromptExecutionSettings {
    let mut settings = config.llm.execution_settings();
    if let Some(max_tokens) = max_tokens {
        settings.max_tokens = Some(max_tokens);
    }
    if let Some(service) = service {
        settings.service_id = Some(service.to_string());
    }
    settings
}

async fn invoke_template(
    kernel: &mut Kernel,
    template: &str,
    arguments: &KernelArguments,
    settings: PromptExecutionSettings,
) -> Result<FunctionResult> {
    let function = kernel.add_function("cli", "prompt", template, settings)?;
    let result = kernel
        .invoke(&function, arguments)
        .await
        .context("Prompt function failed")?;
    Ok(result)
}

fn parse_arguments(pairs: &[String]) -> Result<KernelArguments> {
    pairs
        .iter()
        .map(|pair| {
            KernelArguments::parse_pair(pair).ok_or_else(|| eyre!("Invalid argument '{}', expected KEY=VALUE", pair))
        })
        .collect()
}

fn read_template(input: &TemplateInput) -> Result<String> {
    match (&input.template, &input.file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => {
            fs::read_to_string(path).context(format!("Failed to read template from {}", path.display()))
        }
        (None, None) => Ok(KIND_OF_DAY.to_string()),
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => run_sample(config).await,
        Some(Commands::Render { input }) => handle_render_command(input, config).await,
        Some(Commands::Invoke {
            input,
            max_tokens,
            service,
        }) => handle_invoke_command(input, *max_tokens, service.as_deref(), cli.is_verbose(), config).await,
        Some(Commands::Functions) => handle_functions_command(config),
    }
}

async fn run_sample(config: &Config) -> Result<()> {
    info!("Running kind-of-day sample");
    let mut kernel = build_kernel(config);
    add_azure_service(&mut kernel, config, &config.llm.service_id)?;
    let arguments = KernelArguments::new();

    println!("{}", "--- Rendered Prompt ---".cyan());
    let rendered = kernel
        .render_text(KIND_OF_DAY, &arguments)
        .await
        .context("Failed to render prompt")?;
    println!("{}", rendered);

    let kind_of_day = kernel.add_function(
        "TimePlugin",
        "kind_of_day",
        KIND_OF_DAY,
        config.llm.execution_settings(),
    )?;

    println!("{}", "--- Prompt Function Result ---".cyan());
    let result = kernel
        .invoke(&kind_of_day, &arguments)
        .await
        .context("Prompt function failed")?;
    println!("{}", result);
    Ok(())
}

async fn handle_render_command(input: &TemplateInput, config: &Config) -> Result<()> {
    let template = read_template(input)?;
    let arguments = parse_arguments(&input.args)?;
    info!("Rendering template ({} bytes, {} arguments)", template.len(), arguments.len());
    for (name, value) in arguments.iter() {
        log::debug!("Argument {} = {:?}", name, value);
    }

    let kernel = build_kernel(config);
    let rendered = kernel
        .render_text(&template, &arguments)
        .await
        .context("Failed to render template")?;
    println!("{}", rendered);
    Ok(())
}

async fn handle_invoke_command(
    input: &TemplateInput,
    max_tokens: Option<u32>,
    service: Option<&str>,
    verbose: bool,
    config: &Config,
) -> Result<()> {
    let template = read_template(input)?;
    let arguments = parse_arguments(&input.args)?;

    let settings = invoke_settings(config, max_tokens, service);
    let service_id = settings.service_id.as_deref().unwrap_or(&config.llm.service_id);

    // The backend is registered under whichever id the prompt targets
    let mut kernel = build_kernel(config);
    add_azure_service(&mut kernel, config, service_id)?;
    let result = invoke_template(&mut kernel, &template, &arguments, settings).await?;

    if verbose {
        println!("{}", "--- Rendered Prompt ---".cyan());
        println!("{}", result.rendered_prompt);
        println!("{}", "--- Prompt Function Result ---".cyan());
    }
    println!("{}", result);
    if verbose {
        println!(
            "{} {} prompt + {} completion tokens ({:?})",
            "Usage:".green(),
            result.usage.prompt_tokens,
            result.usage.completion_tokens,
            result.finish_reason
        );
    }
    Ok(())
}

fn handle_functions_command(config: &Config) -> Result<()> {
    let kernel = build_kernel(config);
    let registry = kernel.plugins();
    for (plugin, function) in registry.list() {
        let description = registry
            .resolve(&plugin, &function)
            .map(|f| f.description().to_string())
            .unwrap_or_default();
        println!("{}  {}", format!("{}.{}", plugin, function).green(), description);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    // Setup logging first so config fallback warnings are recorded
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(&config);

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptkernel::llm::MockChatClient;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn input(template: Option<&str>, file: Option<PathBuf>) -> TemplateInput {
        TemplateInput {
            template: template.map(str::to_string),
            file,
            args: Vec::new(),
        }
    }

    #[test]
    fn test_parse_arguments() {
        let args = parse_arguments(&["name=World".to_string(), "days=3".to_string()]).unwrap();
        assert_eq!(args.get("name"), Some("World"));
        assert_eq!(args.get("days"), Some("3"));

        let err = parse_arguments(&["name".to_string()]).unwrap_err();
        assert!(err.to_string().contains("expected KEY=VALUE"));
    }

    #[test]
    fn test_read_template_sources() {
        assert_eq!(read_template(&input(Some("Hi {{name}}"), None)).unwrap(), "Hi {{name}}");
        assert_eq!(read_template(&input(None, None)).unwrap(), KIND_OF_DAY);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Today is {{{{time.day}}}}").unwrap();
        let text = read_template(&input(None, Some(file.path().to_path_buf()))).unwrap();
        assert_eq!(text, "Today is {{time.day}}");

        assert!(read_template(&input(None, Some(PathBuf::from("/nonexistent/prompt.txt")))).is_err());
    }

    #[test]
    fn test_invoke_settings_overrides() {
        let config = Config::default();

        let settings = invoke_settings(&config, None, None);
        assert_eq!(settings.service_id.as_deref(), Some("template_language"));
        assert_eq!(settings.max_tokens, Some(100));

        let settings = invoke_settings(&config, Some(20), Some("writer"));
        assert_eq!(settings.service_id.as_deref(), Some("writer"));
        assert_eq!(settings.max_tokens, Some(20));
    }

    #[tokio::test]
    async fn test_invoke_reaches_service_named_on_command_line() {
        let config = Config::default();
        let settings = invoke_settings(&config, Some(20), Some("writer"));

        let client = Arc::new(MockChatClient::new().with_text("ok"));
        let mut kernel = build_kernel(&config);
        kernel.add_service(settings.service_id.clone().unwrap(), client.clone());

        let arguments = KernelArguments::new().with("name", "World");
        let result = invoke_template(&mut kernel, "Hi {{name}}", &arguments, settings)
            .await
            .unwrap();

        assert_eq!(result.to_string(), "ok");
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, Some(20));
        assert_eq!(requests[0].messages[0].content, "Hi World");
    }

    #[tokio::test]
    async fn test_build_kernel_applies_undefined_policy() {
        let mut config = Config::default();
        let kernel = build_kernel(&config);
        assert!(kernel.render_text("Hi {{name}}", &KernelArguments::new()).await.is_err());

        config.template.on_undefined = promptkernel::template::UndefinedPolicy::Empty;
        let kernel = build_kernel(&config);
        let rendered = kernel.render_text("Hi {{name}}", &KernelArguments::new()).await.unwrap();
        assert_eq!(rendered, "Hi ");
    }
}
