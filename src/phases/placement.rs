//! Phase 2: Placement
//!
//! Finds the real project root inside the staging directory and moves it to
//! `<root>/<target_dir>/<slug>`.
//!
//! Templates often wrap the project in an extra directory (for example
//! `{project_slug}-workspace/{project_slug}`). After the move, directories
//! left empty by it are pruned. Anything else that was generated next to the
//! project is never deleted silently: it is moved to `<slug>-wrapper` (or the
//! first free `<slug>-wrapper-N`) beside the project and reported for manual
//! review.
//!
//! Every problem except failing to move the project itself is a placement
//! warning.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::TemplateSource;
use crate::error::{Error, Result};
use crate::filesystem::{is_empty_dir, move_dir, remove_path};
use crate::path::{join_within, repo_relative, to_slash};
use crate::report::{Action, Report, WarningKind};

/// The project after it reached its final location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedProject {
    /// Absolute path of the project directory.
    pub path: PathBuf,
    /// Path relative to the monorepo root, with forward slashes.
    pub rel: String,
}

fn placement_error(message: String) -> Error {
    Error::Placement { message }
}

/// First staging subdirectory whose lowercase name contains the slug.
fn search_by_slug(staging: &Path, slug: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(staging)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains(slug)
        })
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Resolve the project root inside `staging`.
///
/// Falls back to a directory named like the slug, then to the staging
/// directory itself, warning at each step.
pub fn locate(staging: &Path, source: &TemplateSource, slug: &str, report: &mut Report) -> PathBuf {
    let pattern = source
        .integration_path(slug)
        .unwrap_or_else(|| slug.to_string());
    let candidate = staging.join(&pattern);
    if candidate.is_dir() {
        return candidate;
    }

    report.warn(
        WarningKind::Placement,
        pattern.as_str(),
        "not found in the generated output, searching for the project",
    );
    if let Some(found) = search_by_slug(staging, slug) {
        let shown = found
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        report.warn(
            WarningKind::Placement,
            shown,
            "using the generated directory that matches the slug",
        );
        return found;
    }

    report.warn(
        WarningKind::Placement,
        slug,
        "no directory matches the slug, using the whole generated output",
    );
    staging.to_path_buf()
}

/// Remove directories between `from` and `staging` that the move left empty.
fn prune_empty_parents(from: &Path, staging: &Path) -> Result<()> {
    let mut current = from.parent();
    while let Some(dir) = current {
        if dir == staging || !dir.starts_with(staging) || !is_empty_dir(dir)? {
            break;
        }
        fs::remove_dir(dir)?;
        current = dir.parent();
    }
    Ok(())
}

/// First of `<slug>-wrapper`, `<slug>-wrapper-2`, ... that does not exist yet.
fn free_wrapper_path(parent: &Path, slug: &str) -> PathBuf {
    let base = format!("{}-wrapper", slug);
    let mut candidate = parent.join(&base);
    let mut n = 2;
    while candidate.exists() {
        candidate = parent.join(format!("{}-{}", base, n));
        n += 1;
    }
    candidate
}

/// Move whatever is left in `staging` to a fresh `<parent>/<slug>-wrapper`.
///
/// An existing directory of that name is left alone; a numbered sibling is
/// used instead.
fn keep_leftovers(staging: &Path, root: &Path, parent: &Path, slug: &str, report: &mut Report) {
    let leftovers: Vec<PathBuf> = match fs::read_dir(staging) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => return,
    };
    if leftovers.is_empty() {
        return;
    }

    let keep = free_wrapper_path(parent, slug);
    let shown = repo_relative(root, &keep).unwrap_or_else(|_| to_slash(&keep));
    let relocate = || -> Result<()> {
        fs::create_dir_all(&keep)?;
        for entry in &leftovers {
            if let Some(name) = entry.file_name() {
                fs::rename(entry, keep.join(name))?;
            }
        }
        Ok(())
    };

    match relocate() {
        Ok(()) => report.warn(
            WarningKind::Placement,
            shown,
            format!(
                "template wrapper was not empty, {} item(s) moved here for review",
                leftovers.len()
            ),
        ),
        Err(e) => report.warn(
            WarningKind::Placement,
            shown,
            format!("template wrapper was not empty and could not be kept: {}", e),
        ),
    }
}

/// Execute Phase 2: move the generated project into the monorepo
pub fn execute(
    staging: &Path,
    root: &Path,
    source: &TemplateSource,
    slug: &str,
    report: &mut Report,
) -> Result<PlacedProject> {
    let parent = join_within(root, &source.target_dir)?;
    fs::create_dir_all(&parent).map_err(|e| {
        placement_error(format!("Failed to create '{}': {}", parent.display(), e))
    })?;
    let destination = parent.join(slug);
    let rel = repo_relative(root, &destination)?;

    let found = locate(staging, source, slug, report);

    if destination.exists() {
        remove_path(&destination)
            .map_err(|e| placement_error(format!("Failed to replace '{}': {}", rel, e)))?;
        report.warn(WarningKind::Placement, rel.as_str(), "replaced an existing directory");
    }

    move_dir(&found, &destination)
        .map_err(|e| placement_error(format!("Failed to move project to '{}': {}", rel, e)))?;
    debug!("Moved {} -> {}", found.display(), destination.display());
    report.record(
        Action::Moved,
        rel.as_str(),
        format!("generated from template '{}'", source.name),
    );

    if found != staging {
        if let Err(e) = prune_empty_parents(&found, staging) {
            report.warn(
                WarningKind::Placement,
                rel.as_str(),
                format!("could not tidy the template wrapper: {}", e),
            );
        }
        keep_leftovers(staging, root, &parent, slug, report);
    }

    Ok(PlacedProject {
        path: destination,
        rel,
    })
}
