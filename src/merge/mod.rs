//! Merge operations for project configuration fragments
//!
//! Each submodule folds one kind of project-scoped configuration into its
//! monorepo-wide counterpart. Every merge has a pure text-level core (used by
//! tests and benchmarks) and a thin file-level wrapper that reads the
//! fragment, writes the monorepo target atomically and removes the project
//! copy.
//!
//! ## Supported Surfaces
//!
//! - Attributes (attributes.rs) - `.gitattributes` with path prefixes
//! - Pre-commit (precommit.rs) - hook repositories scoped with `files`
//! - Workflows (workflows.rs) - CI workflows with `paths` filters
//! - Versioning (versioning.rs) - VCS-derived versions in `pyproject.toml`
//! - Workspace (workspace.rs) - root `package.json` workspaces
//! - Run configurations (run_configs.rs) - IDE launchers for npm scripts
//!
//! ## Idempotence
//!
//! Merging the same fragment twice never duplicates entries. The second run
//! reports [`MergeOutcome::Unchanged`] and leaves the target byte-identical.

pub mod attributes;
pub mod precommit;
pub mod run_configs;
pub mod versioning;
pub mod workflows;
pub mod workspace;

use crate::error::{Error, Result};
use std::path::Path;

/// Result of one merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The project carries no fragment for this step.
    Absent,
    /// New entries were written to the monorepo target.
    Merged(String),
    /// Everything in the fragment was already present.
    Unchanged(String),
    /// The fragment exists but this step has nothing to do with it.
    NotApplicable(String),
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged(_))
    }
}

/// Read a fragment that must be valid UTF-8, tagging failures with `operation`.
pub(crate) fn read_fragment(path: &Path, operation: &str) -> Result<Option<String>> {
    crate::filesystem::read_optional(path).map_err(|e| Error::Merge {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}

/// Write a monorepo target atomically, tagging failures with `operation`.
pub(crate) fn write_target(path: &Path, content: &str, operation: &str) -> Result<()> {
    crate::filesystem::write_atomic(path, content).map_err(|e| Error::Merge {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}

/// Delete a merged project fragment, tagging failures with `operation`.
pub(crate) fn remove_fragment(path: &Path, operation: &str) -> Result<()> {
    crate::filesystem::remove_path(path)
        .map(|_| ())
        .map_err(|e| Error::Merge {
            operation: operation.to_string(),
            message: format!("merged but could not remove {}: {}", path.display(), e),
        })
}

/// Count leading spaces of a line.
pub(crate) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Whether a line carries no YAML/TOML content.
pub(crate) fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
