//! promptkernel - prompt templates with plugin functions and chat completion
//!
//! Templates embed `{{plugin.function}}` and `{{variable}}` expressions. The
//! kernel renders them against registered plugins and an argument set, then
//! forwards the rendered prompt to a chat-completion backend.

pub mod error;
pub mod kernel;
pub mod llm;
pub mod plugins;
pub mod template;

pub use error::{KernelError, Result};
pub use kernel::{Kernel, KernelArguments, PromptExecutionSettings};
