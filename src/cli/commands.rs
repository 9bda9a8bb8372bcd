//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - render: render a template locally
//! - invoke: render a template and send it to the backend
//! - functions: list registered plugin functions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// promptkernel - render prompt templates and invoke a chat backend
#[derive(Parser, Debug)]
#[command(name = "promptkernel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a template without calling the backend
    Render {
        #[command(flatten)]
        input: TemplateInput,
    },

    /// Render a template and send it to the backend
    Invoke {
        #[command(flatten)]
        input: TemplateInput,

        /// Maximum number of output tokens
        #[arg(short, long)]
        max_tokens: Option<u32>,

        /// Service id to send the prompt to
        #[arg(short, long)]
        service: Option<String>,
    },

    /// List registered plugin functions
    Functions,
}

/// Where the template comes from and which arguments it receives
#[derive(Args, Debug, Clone)]
pub struct TemplateInput {
    /// Template text
    #[arg(short, long, conflicts_with = "file")]
    pub template: Option<String>,

    /// Read the template from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Template argument as key=value (repeatable)
    #[arg(short, long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,
}
