//! Plugin System - named groups of functions callable from templates
//!
//! This module provides:
//! - PluginFunction trait and closure adapter
//! - PluginRegistry keyed by `(plugin, function)`
//! - TimePlugin with a pluggable clock

mod function;
mod registry;
mod time;

pub use function::{FnFunction, Plugin, PluginFunction, function};
pub use registry::PluginRegistry;
pub use time::{Clock, FixedClock, SystemClock, TimePlugin};
