// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Compile, bundle and copy web assets; optionally watch and rebuild.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, in order (e.g. `clean release`).
    ///
    /// Tasks named on the command line run one after another; children of a
    /// composite task run concurrently. Defaults to `default`.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// When omitted, `Assetpipe.toml` is used if present, otherwise the
    /// built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print the task registry, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Task names to run, falling back to `default`.
    pub fn task_names(&self) -> Vec<String> {
        if self.tasks.is_empty() {
            vec!["default".to_string()]
        } else {
            self.tasks.clone()
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
