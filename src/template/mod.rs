//! Template System - parsing and rendering of prompt templates
//!
//! Templates embed `{{plugin.function}}` and `{{variable}}` expressions in
//! literal text. Parsing is pure and happens before any function runs.

mod parser;
mod render;
mod segment;

pub use parser::parse;
pub use render::{Renderer, UndefinedPolicy};
pub use segment::{CLOSE, OPEN, Reference, Segment, Template};
