//! Implementation of the phases of the add operation.
//!
//! ## Overview
//!
//! Adding a project follows 4 phases:
//! 1. Acquisition - Generate the project into a staging directory
//! 2. Placement - Move the real project root to its final location
//! 3. Detection - Classify the project by its marker files
//! 4. Integration - Merge the project's configuration into the monorepo
//!
//! Phase 1 is the only one that talks to template engines, and it never
//! touches the monorepo outside its staging directory. Phase 2 is the first
//! to change the monorepo. From Phase 4 on, failures are collected in the
//! [`Report`](crate::report::Report) instead of aborting the run.
//!
//! The [`orchestrator`] ties the phases together.

pub mod acquisition;
pub mod detection;
pub mod integration;
pub mod orchestrator;
pub mod placement;

pub use acquisition as phase1;
pub use detection as phase3;
pub use integration as phase4;
pub use placement as phase2;

pub use detection::ProjectKind;
pub use orchestrator::{execute_add, AddOutcome, AddRequest};
