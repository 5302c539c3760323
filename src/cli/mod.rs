//! Command-line interface for survose
//!
//! - `args`: clap definitions
//! - `run`: entry point, config discovery and dispatch
//! - `commands`: one module per subcommand plus shared I/O helpers

pub mod args;
mod commands;
mod run;


pub use args::{Cli, Commands, build_cli};
pub use run::run;
