//! CLI module for promptkernel - command-line interface and subcommands.
//!
//! Without a subcommand the binary runs the kind-of-day sample: it renders a
//! prompt built from time plugin values and sends it to the backend.

pub mod commands;

pub use commands::Cli;
