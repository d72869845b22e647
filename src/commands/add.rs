//! # Add Command Implementation
//!
//! Adds one project to the monorepo: generates it from the configured
//! template, places it, and folds its configuration into the monorepo.
//!
//! ## Defaults
//!
//! - **Root**: `--root`, else the nearest ancestor of the current directory
//!   holding `.monorepo/`, else the current directory
//! - **Config**: `--config`, else `<root>/.monorepo/project-templates.yaml`
//!
//! Whatever the pipeline recorded is printed even when it fails part way.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use add_project::defaults::{find_monorepo_root, DEFAULT_CONFIG_PATH};
use add_project::output::{emoji, render_report, OutputConfig};
use add_project::phases::{execute_add, AddRequest};
use add_project::report::Report;
use add_project::runner::SystemCommandRunner;

/// Add a project to the monorepo from a template
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Template type, as named under `templates:` in the configuration
    #[arg(value_name = "TEMPLATE_TYPE")]
    pub template_type: String,

    /// Display name of the new project (e.g. "My Tool")
    #[arg(value_name = "PROJECT_NAME")]
    pub project_name: String,

    /// Monorepo root directory
    #[arg(long, value_name = "DIR", env = "ADD_PROJECT_ROOT")]
    pub root: Option<PathBuf>,

    /// Path to the template configuration file
    #[arg(short, long, value_name = "FILE", env = "ADD_PROJECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip installing dependencies after integration
    #[arg(long)]
    pub no_sync: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl AddArgs {
    fn resolve_request(self) -> Result<AddRequest> {
        let root = match self.root {
            Some(root) => root,
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                find_monorepo_root(&cwd)
            }
        };
        let config_path = self
            .config
            .unwrap_or_else(|| root.join(DEFAULT_CONFIG_PATH));

        if !root.is_dir() {
            anyhow::bail!("Monorepo root not found: {}", root.display());
        }
        if !config_path.is_file() {
            return Err(add_project::suggestions::config_not_found(&config_path));
        }

        Ok(AddRequest {
            root,
            config_path,
            template_type: self.template_type,
            project_name: self.project_name,
            sync: !self.no_sync,
        })
    }
}

/// Execute the add command
pub fn execute(args: AddArgs, output: &OutputConfig) -> Result<()> {
    let quiet = args.quiet;
    let request = args.resolve_request()?;

    if !quiet {
        println!(
            "{} Adding '{}' from template '{}'",
            emoji(output, "🚀", "[ADD]"),
            request.project_name,
            request.template_type
        );
        println!();
    }

    let mut report = Report::new();
    let result = execute_add(&request, &SystemCommandRunner, &mut report);
    print!("{}", render_report(&report, output, quiet));

    match result {
        Ok(outcome) => {
            if !quiet {
                println!();
                println!(
                    "{} Added {} at {} ({})",
                    emoji(output, "✅", "[OK]"),
                    outcome.project,
                    outcome.placed.rel,
                    outcome.kind
                );
            }
            Ok(())
        }
        Err(e) => {
            if !quiet {
                println!();
                println!("{} Add failed", emoji(output, "❌", "[FAIL]"));
            }
            Err(e.into())
        }
    }
}
