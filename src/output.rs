//! # Output Configuration
//!
//! This module controls how the CLI renders its results: whether colors and
//! emojis are used, and how the [`Report`] of a run is laid out.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use add_project::output::{render_report, OutputConfig};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! print!("{}", render_report(&report, &config, false));
//! ```

use std::env;

use console::style;

use crate::report::{Action, Report, ReportEntry};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never", or "auto".
    /// In auto mode, colors are disabled if `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

fn entry_line(config: &OutputConfig, entry: &ReportEntry, width: usize) -> String {
    let action = format!("{:<width$}", entry.action.to_string(), width = width);
    let mut line = if entry.action.is_warning() {
        let marker = emoji(config, "⚠️ ", "[WARN]");
        let action = style(action).yellow().force_styling(config.use_color);
        format!("  {} {} {}", marker, action, entry.target)
    } else {
        format!("  {} {}", action, entry.target)
    };
    if !entry.detail.is_empty() {
        line.push_str(" - ");
        line.push_str(&entry.detail);
    }
    line
}

/// Render a run's report for the terminal.
///
/// Follow-ups are listed as numbered next steps after the actions. In quiet
/// mode only warnings are shown.
pub fn render_report(report: &Report, config: &OutputConfig, quiet: bool) -> String {
    let shown: Vec<&ReportEntry> = report
        .entries()
        .iter()
        .filter(|e| e.action != Action::FollowUp)
        .filter(|e| !quiet || e.action.is_warning())
        .collect();
    let width = shown
        .iter()
        .map(|e| e.action.to_string().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    if quiet {
        for entry in shown {
            out.push_str(&entry_line(config, entry, width));
            out.push('\n');
        }
        return out;
    }

    if !shown.is_empty() {
        out.push_str(&format!("{} Actions\n", emoji(config, "📋", "[REPORT]")));
        for entry in &shown {
            out.push_str(&entry_line(config, entry, width));
            out.push('\n');
        }
    }

    let warnings = report.warnings().count();
    if warnings > 0 {
        out.push_str(&format!(
            "\n{} {} warning(s), review them before committing\n",
            emoji(config, "⚠️ ", "[WARN]"),
            warnings
        ));
    }

    let steps: Vec<&ReportEntry> = report.with_action(Action::FollowUp).collect();
    if !steps.is_empty() {
        out.push_str(&format!("\n{} Next steps\n", emoji(config, "💡", "[NEXT]")));
        for (i, step) in steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, step.detail));
        }
    }
    out
}
