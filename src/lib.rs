//! # add-project Library
//!
//! This library scaffolds new sub-projects into a monorepo from external
//! templates and then folds each project's own configuration into the
//! monorepo's shared configuration. It is designed to be used by the
//! `add-project` command-line tool but the pipeline and every merge
//! operation can be driven directly.
//!
//! ## Quick Example
//!
//! ```
//! use add_project::merge::attributes::{merge_rules, prefix_rules};
//! use add_project::slug::ProjectIdentifier;
//!
//! let project = ProjectIdentifier::new("My Tool");
//! assert_eq!(project.slug(), "my-tool");
//!
//! let rules = prefix_rules("*.py text=auto\n", "packages/my-tool");
//! let merged = merge_rules("", &rules, "packages/my-tool").unwrap();
//! assert!(merged.contains("packages/my-tool/*.py text=auto"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: The `.monorepo/project-templates.yaml`
//!   document naming the templates and overriding the engine tables.
//! - **Merges (`merge`)**: One module per monorepo surface (attributes,
//!   pre-commit hooks, CI workflows, versioning, workspaces, run
//!   configurations), each idempotent.
//! - **Phases (`phases`)**: The pipeline from template acquisition through
//!   placement and detection to integration.
//! - **Report (`report`)**: The ordered record of everything a run did.
//! - **External tools (`runner`, `git`)**: Template engines, git and package
//!   managers are only reached through the `CommandRunner` trait.
//!
//! ## Execution Flow
//!
//! The main entry point is [`phases::execute_add`]:
//!
//! 1.  **Acquisition**: Render or clone the template into a staging
//!     directory inside the monorepo root.
//! 2.  **Placement**: Move the real project root to `<target_dir>/<slug>`.
//! 3.  **Detection**: Classify the project as python, typescript, hybrid or
//!     unknown.
//! 4.  **Integration**: Run the ordered merge steps, collecting failures as
//!     warnings.

pub mod config;
pub mod customize;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod merge;
pub mod output;
pub mod path;
pub mod phases;
pub mod report;
pub mod runner;
pub mod slug;
pub mod suggestions;

#[cfg(test)]
mod slug_proptest;
