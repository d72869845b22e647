//! CLI argument parsing, logging setup and command dispatch

use anyhow::Result;
use clap::Parser;

use crate::commands;
use add_project::output::OutputConfig;

/// Scaffold a project into the monorepo from a template and merge its configuration
#[derive(Parser, Debug)]
#[command(name = "add-project")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    add: commands::add::AddArgs,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);
        commands::add::execute(self.add, &output)
    }
}

/// Route `log` records to stderr.
///
/// `RUST_LOG` wins over `level`. Initializing twice is harmless.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .target(env_logger::Target::Stderr)
        .try_init();
}
