//! # Error Handling
//!
//! This module defines the centralized error type for the `add-project`
//! library. It uses `thiserror` to derive a single `Error` enum covering every
//! failure the pipeline can hit, from loading the template configuration to
//! rewriting a single monorepo file.
//!
//! ## Fatal and non-fatal errors
//!
//! Only some variants ever reach the command line:
//!
//! - **`ConfigParse`** and **`UnknownTemplate`**: the template configuration
//!   is missing, malformed or does not know the requested template type.
//! - **`Acquisition`** and **`GitClone`**: the templating engine or the clone
//!   failed. Nothing in the monorepo has been touched yet.
//! - **`Placement`**: the generated project could not be moved into place.
//! - **`VcsRemoval`**: the nested `.git` directory could not be removed.
//!
//! Every other variant is produced inside a single merge step. The engine
//! catches those and records them as warnings in the
//! [`Report`](crate::report::Report), so the remaining steps still run.

use thiserror::Error;

/// Main error type for add-project operations
#[derive(Error, Debug)]
pub enum Error {
    /// The template configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The requested template type is not defined in the configuration.
    #[error("Template type '{name}' not found in configuration{}\n\n  Available templates: {}", suggestion.as_ref().map(|s| format!("\n  hint: Did you mean '{}'?", s)).unwrap_or_default(), available.join(", "))]
    UnknownTemplate {
        name: String,
        available: Vec<String>,
        /// Closest known template name, if any
        suggestion: Option<String>,
    },

    /// The templating engine failed to produce a project.
    ///
    /// Output of the engine is carried verbatim so the template author can
    /// see what went wrong.
    #[error("Acquisition failed for template '{template}': {message}{}{}", format_stream("stdout", stdout), format_stream("stderr", stderr))]
    Acquisition {
        template: String,
        message: String,
        stdout: String,
        stderr: String,
    },

    /// A shallow clone of a template repository failed.
    #[error("Git clone error for {url}@{reference}: {message}")]
    GitClone {
        url: String,
        reference: String,
        message: String,
    },

    /// The generated project could not be moved to its final location.
    #[error("Placement error: {message}")]
    Placement { message: String },

    /// The project's own version-control directory could not be removed.
    #[error("Could not remove nested VCS directory {path}: {message}")]
    VcsRemoval { path: String, message: String },

    /// A merge step failed to parse or rewrite its target.
    #[error("Merge operation error: {operation} - {message}")]
    Merge { operation: String, message: String },

    /// An error occurred with a filesystem operation on disk.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

fn format_stream(label: &str, content: &str) -> String {
    let trimmed = content.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n\n{}:\n{}", label, trimmed)
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
