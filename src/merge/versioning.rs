//! VCS-derived version fix-up for `pyproject.toml`
//!
//! hatch-vcs and setuptools-scm look for `.git` next to `pyproject.toml`.
//! Inside the monorepo that directory is gone, so they are pointed at the
//! monorepo root with a relative `root`. The document is only inspected
//! structurally; the edit is a single inserted or replaced line so the rest
//! of the file keeps its formatting.

use super::{read_fragment, write_target, MergeOutcome};
use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::path::Path;
use toml::{Table, Value as TomlValue};

pub const PYPROJECT_FILE: &str = "pyproject.toml";

const OPERATION: &str = "versioning fix-up";

fn merge_error(message: impl Into<String>) -> Error {
    Error::Merge {
        operation: OPERATION.to_string(),
        message: message.into(),
    }
}

/// A build plugin that derives the version from VCS metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsBackend {
    HatchVcs,
    SetuptoolsScm,
}

impl VcsBackend {
    /// Dotted name of the configuration table.
    fn table(&self) -> &'static [&'static str] {
        match self {
            VcsBackend::HatchVcs => &["tool", "hatch", "version"],
            VcsBackend::SetuptoolsScm => &["tool", "setuptools_scm"],
        }
    }

    /// Lines for a table appended from scratch.
    fn new_table(&self, root: &str) -> String {
        match self {
            VcsBackend::HatchVcs => {
                format!("[tool.hatch.version]\nsource = \"vcs\"\nroot = \"{}\"\n", root)
            }
            VcsBackend::SetuptoolsScm => format!("[tool.setuptools_scm]\nroot = \"{}\"\n", root),
        }
    }
}

impl fmt::Display for VcsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsBackend::HatchVcs => f.write_str("hatch-vcs"),
            VcsBackend::SetuptoolsScm => f.write_str("setuptools-scm"),
        }
    }
}

fn lookup<'a>(doc: &'a Table, path: &[&str]) -> Option<&'a TomlValue> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(doc.get(*first)?, |value, key| value.get(*key))
}

/// Normalized distribution name of a PEP 508 requirement string.
fn requirement_name(requirement: &str) -> String {
    requirement
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .map(|c| match c {
            '_' | '.' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Which VCS version plugins a `pyproject.toml` uses.
pub fn detect_backends(doc: &Table) -> Vec<VcsBackend> {
    let requires: Vec<String> = lookup(doc, &["build-system", "requires"])
        .and_then(TomlValue::as_array)
        .map(|reqs| {
            reqs.iter()
                .filter_map(TomlValue::as_str)
                .map(requirement_name)
                .collect()
        })
        .unwrap_or_default();

    let mut backends = Vec::new();
    let hatch_source = lookup(doc, &["tool", "hatch", "version", "source"]).and_then(TomlValue::as_str);
    if requires.iter().any(|r| r == "hatch-vcs") || hatch_source == Some("vcs") {
        backends.push(VcsBackend::HatchVcs);
    }
    if requires.iter().any(|r| r == "setuptools-scm")
        || lookup(doc, &["tool", "setuptools_scm"]).is_some_and(TomlValue::is_table)
    {
        backends.push(VcsBackend::SetuptoolsScm);
    }
    backends
}

fn has_custom_root(value: Option<&TomlValue>) -> bool {
    value
        .and_then(TomlValue::as_str)
        .is_some_and(|root| root.trim_end_matches('/') != ".")
}

/// Whether the backend already finds a repository outside the project.
pub fn is_configured(doc: &Table, backend: VcsBackend) -> bool {
    match backend {
        VcsBackend::HatchVcs => {
            has_custom_root(lookup(doc, &["tool", "hatch", "version", "root"]))
                || has_custom_root(lookup(
                    doc,
                    &["tool", "hatch", "version", "raw-options", "root"],
                ))
        }
        VcsBackend::SetuptoolsScm => {
            has_custom_root(lookup(doc, &["tool", "setuptools_scm", "root"]))
                || lookup(doc, &["tool", "setuptools_scm", "search_parent_directories"])
                    .and_then(TomlValue::as_bool)
                    .unwrap_or(false)
        }
    }
}

/// Point `backend` at `root` by editing the text of `content`.
fn set_root(content: &str, backend: VcsBackend, root: &str) -> Result<String> {
    let dotted = backend
        .table()
        .iter()
        .map(|part| regex::escape(part))
        .collect::<Vec<_>>()
        .join(r"\s*\.\s*");
    let header_re = Regex::new(&format!(r"^\s*\[\s*{}\s*\]\s*(?:#.*)?$", dotted))?;
    let root_re = Regex::new(r"^\s*root\s*=")?;
    let root_line = format!("root = \"{}\"", root);

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    match lines.iter().position(|l| header_re.is_match(l)) {
        Some(header) => {
            let table_end = lines[header + 1..]
                .iter()
                .position(|l| l.trim_start().starts_with('['))
                .map_or(lines.len(), |p| header + 1 + p);
            match (header + 1..table_end).find(|&i| root_re.is_match(&lines[i])) {
                Some(existing) => lines[existing] = root_line,
                None => lines.insert(header + 1, root_line),
            }
            let mut edited = lines.join("\n");
            if content.ends_with('\n') {
                edited.push('\n');
            }
            Ok(edited)
        }
        None => {
            let mut edited = content.to_string();
            if !edited.is_empty() && !edited.ends_with('\n') {
                edited.push('\n');
            }
            if !edited.is_empty() {
                edited.push('\n');
            }
            edited.push_str(&backend.new_table(root));
            Ok(edited)
        }
    }
}

/// Outcome for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFix {
    Injected(VcsBackend),
    AlreadyConfigured(VcsBackend),
}

/// Make every VCS version plugin in `content` look for the repository at
/// `root` (relative to the project).
pub fn fix_versioning(content: &str, root: &str) -> Result<(String, Vec<VersionFix>)> {
    let doc: Table = content
        .parse()
        .map_err(|e: toml::de::Error| merge_error(format!("Failed to parse pyproject.toml: {}", e)))?;

    let mut edited = content.to_string();
    let mut fixes = Vec::new();
    for backend in detect_backends(&doc) {
        if is_configured(&doc, backend) {
            fixes.push(VersionFix::AlreadyConfigured(backend));
            continue;
        }
        let candidate = set_root(&edited, backend, root)?;
        let reparsed: Table = candidate.parse().map_err(|e: toml::de::Error| {
            merge_error(format!("{} edit produced invalid TOML: {}", backend, e))
        })?;
        if !is_configured(&reparsed, backend) {
            return Err(merge_error(format!(
                "could not set root for {}; configure it manually",
                backend
            )));
        }
        edited = candidate;
        fixes.push(VersionFix::Injected(backend));
    }
    Ok((edited, fixes))
}

/// Apply [`fix_versioning`] to `<project>/pyproject.toml`.
pub fn fix_project(project: &Path, root: &str) -> Result<MergeOutcome> {
    let path = project.join(PYPROJECT_FILE);
    let Some(content) = read_fragment(&path, OPERATION)? else {
        return Ok(MergeOutcome::Absent);
    };

    let (edited, fixes) = fix_versioning(&content, root)?;
    if fixes.is_empty() {
        return Ok(MergeOutcome::NotApplicable(
            "no VCS-derived version".to_string(),
        ));
    }

    let describe = |pick: fn(&VersionFix) -> Option<VcsBackend>| {
        fixes
            .iter()
            .filter_map(pick)
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
    };
    let injected = describe(|f| match f {
        VersionFix::Injected(b) => Some(*b),
        _ => None,
    });

    if injected.is_empty() {
        let configured = describe(|f| match f {
            VersionFix::AlreadyConfigured(b) => Some(*b),
            _ => None,
        });
        return Ok(MergeOutcome::Unchanged(format!(
            "{} already configured",
            configured.join(", ")
        )));
    }

    write_target(&path, &edited, OPERATION)?;
    Ok(MergeOutcome::Merged(format!(
        "root = \"{}\" set for {}",
        root,
        injected.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HATCH: &str = r#"[build-system]
requires = ["hatchling", "hatch-vcs>=0.4"]
build-backend = "hatchling.build"

[project]
name = "my-tool"
dynamic = ["version"]

[tool.hatch.version]
source = "vcs"

[tool.ruff]
line-length = 100
"#;

    fn parse(text: &str) -> Table {
        text.parse().unwrap()
    }

    #[test]
    fn test_requirement_name() {
        assert_eq!(requirement_name("setuptools_scm[toml]>=6.2"), "setuptools-scm");
        assert_eq!(requirement_name(" Hatch-VCS >= 0.4"), "hatch-vcs");
        assert_eq!(requirement_name("hatch.vcs"), "hatch-vcs");
    }

    #[test]
    fn test_detect_backends() {
        assert_eq!(detect_backends(&parse(HATCH)), vec![VcsBackend::HatchVcs]);

        let scm = "[build-system]\nrequires = [\"setuptools>=64\", \"setuptools_scm>=8\"]\n";
        assert_eq!(detect_backends(&parse(scm)), vec![VcsBackend::SetuptoolsScm]);

        let table_only = "[tool.setuptools_scm]\nversion_file = \"v.py\"\n";
        assert_eq!(
            detect_backends(&parse(table_only)),
            vec![VcsBackend::SetuptoolsScm]
        );

        assert!(detect_backends(&parse("[project]\nname = \"x\"\n")).is_empty());
    }

    #[test]
    fn test_hatch_root_inserted_under_header() {
        let (edited, fixes) = fix_versioning(HATCH, "../..").unwrap();
        assert_eq!(fixes, vec![VersionFix::Injected(VcsBackend::HatchVcs)]);
        assert!(edited.contains("[tool.hatch.version]\nroot = \"../..\"\nsource = \"vcs\"\n"));
        // Everything else untouched
        assert_eq!(edited.replace("root = \"../..\"\n", ""), HATCH);
    }

    #[test]
    fn test_hatch_table_appended_when_missing() {
        let input = "[build-system]\nrequires = [\"hatchling\", \"hatch-vcs\"]";
        let (edited, _) = fix_versioning(input, "../..").unwrap();
        assert_eq!(
            edited,
            "[build-system]\nrequires = [\"hatchling\", \"hatch-vcs\"]\n\n[tool.hatch.version]\nsource = \"vcs\"\nroot = \"../..\"\n"
        );
    }

    #[test]
    fn test_default_root_replaced() {
        let input = "[tool.setuptools_scm]\nroot = \".\"\nversion_file = \"v.py\"\n";
        let (edited, fixes) = fix_versioning(input, "../../..").unwrap();
        assert_eq!(fixes, vec![VersionFix::Injected(VcsBackend::SetuptoolsScm)]);
        assert_eq!(
            edited,
            "[tool.setuptools_scm]\nroot = \"../../..\"\nversion_file = \"v.py\"\n"
        );
    }

    #[test]
    fn test_already_configured_left_alone() {
        let custom = "[tool.setuptools_scm]\nroot = \"..\"\n";
        let (edited, fixes) = fix_versioning(custom, "../..").unwrap();
        assert_eq!(edited, custom);
        assert_eq!(fixes, vec![VersionFix::AlreadyConfigured(VcsBackend::SetuptoolsScm)]);

        let search = "[tool.setuptools_scm]\nsearch_parent_directories = true\n";
        let (_, fixes) = fix_versioning(search, "../..").unwrap();
        assert_eq!(fixes, vec![VersionFix::AlreadyConfigured(VcsBackend::SetuptoolsScm)]);

        let raw = "[tool.hatch.version]\nsource = \"vcs\"\nraw-options = { root = \"../..\" }\n";
        let (_, fixes) = fix_versioning(raw, "../..").unwrap();
        assert_eq!(fixes, vec![VersionFix::AlreadyConfigured(VcsBackend::HatchVcs)]);
    }

    #[test]
    fn test_fix_project_is_idempotent() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PYPROJECT_FILE), HATCH).unwrap();

        let first = fix_project(temp.path(), "../..").unwrap();
        assert!(first.is_merged());
        let after_first = fs::read_to_string(temp.path().join(PYPROJECT_FILE)).unwrap();

        let second = fix_project(temp.path(), "../..").unwrap();
        assert!(matches!(second, MergeOutcome::Unchanged(_)));
        assert_eq!(
            fs::read_to_string(temp.path().join(PYPROJECT_FILE)).unwrap(),
            after_first
        );
    }

    #[test]
    fn test_fix_project_without_vcs_versioning() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PYPROJECT_FILE), "[project]\nname = \"x\"\n").unwrap();
        assert!(matches!(
            fix_project(temp.path(), "../..").unwrap(),
            MergeOutcome::NotApplicable(_)
        ));
    }
}
