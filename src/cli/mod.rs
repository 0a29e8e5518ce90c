//! CLI module for docbuddy
//!
//! Handles command-line argument parsing and subcommand dispatch.

pub mod args;
pub mod commands;

pub use args::{Args, Commands, Verbosity};
pub use commands::{init_config, print_reply, run};
