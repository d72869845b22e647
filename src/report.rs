//! Structured record of everything an integration run did
//!
//! Every phase appends `(action, target, detail)` entries to a shared
//! [`Report`]. Entries are never removed or rewritten, so a warning recorded
//! by an early step is always visible in the final output. Rendering is left
//! to the CLI (see [`crate::output::render_report`]).

use log::{debug, info};
use std::fmt;

/// The category of a non-fatal problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The generated project could not be located or relocated cleanly.
    Placement,
    /// A merge step failed and was skipped.
    Merge,
    /// The project's license differs from the monorepo's.
    License,
    /// The package manager sync failed.
    Sync,
    /// The template produced something unexpected but usable.
    Acquisition,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningKind::Placement => "placement",
            WarningKind::Merge => "merge",
            WarningKind::License => "license",
            WarningKind::Sync => "sync",
            WarningKind::Acquisition => "acquisition",
        };
        f.write_str(label)
    }
}

/// What happened to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Kept,
    Removed,
    Created,
    Moved,
    Merged,
    Customized,
    Detected,
    Skipped,
    Synced,
    Warning(WarningKind),
    FollowUp,
}

impl Action {
    /// Whether this action represents a problem the user should look at.
    pub fn is_warning(&self) -> bool {
        matches!(self, Action::Warning(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Kept => f.write_str("kept"),
            Action::Removed => f.write_str("removed"),
            Action::Created => f.write_str("created"),
            Action::Moved => f.write_str("moved"),
            Action::Merged => f.write_str("merged"),
            Action::Customized => f.write_str("customized"),
            Action::Detected => f.write_str("detected"),
            Action::Skipped => f.write_str("skipped"),
            Action::Synced => f.write_str("synced"),
            Action::Warning(kind) => write!(f, "{} warning", kind),
            Action::FollowUp => f.write_str("follow-up"),
        }
    }
}

/// A single report record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub action: Action,
    /// The file, directory or tool the action applies to.
    pub target: String,
    /// Human-readable description.
    pub detail: String,
}

/// Ordered, append-only log of a run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, action: Action, target: impl Into<String>, detail: impl Into<String>) {
        let entry = ReportEntry {
            action,
            target: target.into(),
            detail: detail.into(),
        };
        if action.is_warning() {
            info!("{}: {} ({})", entry.action, entry.target, entry.detail);
        } else {
            debug!("{}: {} ({})", entry.action, entry.target, entry.detail);
        }
        self.entries.push(entry);
    }

    pub fn kept(&mut self, target: impl Into<String>, detail: impl Into<String>) {
        self.record(Action::Kept, target, detail);
    }

    pub fn removed(&mut self, target: impl Into<String>, detail: impl Into<String>) {
        self.record(Action::Removed, target, detail);
    }

    pub fn created(&mut self, target: impl Into<String>, detail: impl Into<String>) {
        self.record(Action::Created, target, detail);
    }

    pub fn merged(&mut self, target: impl Into<String>, detail: impl Into<String>) {
        self.record(Action::Merged, target, detail);
    }

    pub fn skipped(&mut self, target: impl Into<String>, detail: impl Into<String>) {
        self.record(Action::Skipped, target, detail);
    }

    pub fn warn(
        &mut self,
        kind: WarningKind,
        target: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.record(Action::Warning(kind), target, detail);
    }

    pub fn follow_up(&mut self, target: impl Into<String>, detail: impl Into<String>) {
        self.record(Action::FollowUp, target, detail);
    }

    /// All entries in the order they were recorded.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Entries describing warnings of any kind.
    pub fn warnings(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.action.is_warning())
    }

    /// Entries of a single warning kind.
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(move |e| e.action == Action::Warning(kind))
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Entries with the given action.
    pub fn with_action(&self, action: Action) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.action == action)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
