//! Venue floor CLI library.
//!
//! This crate provides the CLI interface for the meeple floor tools.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, TablesAction};
pub use config::Config;
