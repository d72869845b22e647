//! CI workflow migration
//!
//! GitHub only reads workflows from the repository root, so every workflow a
//! project ships is moved to `<root>/.github/workflows/<project>-<file>`.
//! On the way each one is scoped to the project:
//!
//! - `push`, `pull_request` and `pull_request_target` triggers get a
//!   `paths: ['<rel>/**']` filter, unless some trigger already declares a
//!   path filter.
//! - Preview-deployment actions get a `path: <rel>` input.
//!
//! Triggers are located by parsing the workflow, but the edit itself is a
//! textual insertion so that comments and formatting survive. Every edit is
//! checked by parsing the result again. Workflows that are not valid YAML
//! fall back to a line-pattern heuristic.

use super::{
    indent_of, is_blank_or_comment, read_fragment, remove_fragment, write_target, MergeOutcome,
};
use crate::error::{Error, Result};
use crate::report::{Action, Report, WarningKind};
use regex::Regex;
use serde_yaml::{Mapping, Value as YamlValue};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const GITHUB_DIR: &str = ".github";
pub const WORKFLOWS_DIR: &str = ".github/workflows";

/// Triggers that accept a `paths` filter and run on code changes.
pub const PATH_TRIGGERS: &[&str] = &["push", "pull_request", "pull_request_target"];

const OPERATION: &str = "workflow migration";

fn merge_error(message: impl Into<String>) -> Error {
    Error::Merge {
        operation: OPERATION.to_string(),
        message: message.into(),
    }
}

/// What happened to a workflow's triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFilterStatus {
    /// A filter was added under these triggers.
    Added(Vec<String>),
    /// The workflow was not valid YAML; the line heuristic added a filter.
    Heuristic,
    /// Some trigger already declares `paths` or `paths-ignore`.
    AlreadyFiltered,
    /// No trigger that takes a path filter.
    NoPathTriggers,
    /// A filter was needed but could not be added.
    Unfiltered(String),
}

impl PathFilterStatus {
    fn describe(&self) -> String {
        match self {
            PathFilterStatus::Added(triggers) => {
                format!("path filter added to {}", triggers.join(", "))
            }
            PathFilterStatus::Heuristic => "path filter added (not parsed as YAML)".to_string(),
            PathFilterStatus::AlreadyFiltered => "already path-filtered".to_string(),
            PathFilterStatus::NoPathTriggers => "no push or pull_request triggers".to_string(),
            PathFilterStatus::Unfiltered(reason) => format!("no path filter: {}", reason),
        }
    }
}

/// A workflow after project scoping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenWorkflow {
    pub content: String,
    pub filter: PathFilterStatus,
    /// Number of preview actions that received a `path` input.
    pub previews: usize,
    /// Why preview injection was abandoned, if it was.
    pub preview_error: Option<String>,
}

/// The glob used in path filters for `rel`.
pub fn path_glob(rel: &str) -> String {
    format!("{}/**", rel.trim_end_matches('/'))
}

fn spaces(n: usize) -> String {
    " ".repeat(n)
}

fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut text = lines.join("\n");
    if trailing_newline {
        text.push('\n');
    }
    text
}

/// The value part of `key: value # comment`, without the comment.
fn inline_value(rest: &str) -> &str {
    let trimmed = rest.trim();
    if trimmed.starts_with('#') {
        return "";
    }
    match trimmed.find(" #") {
        Some(pos) if !trimmed.starts_with('{') && !trimmed.starts_with('[') => trimmed[..pos].trim(),
        _ => trimmed,
    }
}

/// Index and inline remainder of the top-level `on:` key.
fn find_on_line(lines: &[String]) -> Result<Option<(usize, String)>> {
    let on_re = Regex::new(r#"^(?:on|"on"|'on')\s*:(.*)$"#)?;
    Ok(lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| on_re.captures(line).map(|c| (i, c[1].to_string()))))
}

/// End (exclusive) of the indented block that follows line `start`.
fn block_extent(lines: &[String], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() && (is_blank_or_comment(&lines[end]) || indent_of(&lines[end]) > 0) {
        end += 1;
    }
    while end > start + 1 && is_blank_or_comment(&lines[end - 1]) {
        end -= 1;
    }
    end
}

enum TriggerShape {
    Missing,
    Events(Vec<String>),
    Mapping(Mapping),
}

fn trigger_shape(doc: &YamlValue) -> TriggerShape {
    match doc.get("on") {
        Some(YamlValue::String(event)) => TriggerShape::Events(vec![event.clone()]),
        Some(YamlValue::Sequence(events)) => TriggerShape::Events(
            events
                .iter()
                .filter_map(|e| e.as_str().map(str::to_string))
                .collect(),
        ),
        Some(YamlValue::Mapping(map)) => TriggerShape::Mapping(map.clone()),
        _ => TriggerShape::Missing,
    }
}

fn filter_value(rel: &str) -> YamlValue {
    YamlValue::Sequence(vec![YamlValue::String(path_glob(rel))])
}

/// Add `paths: ['<rel>/**']` to every path-taking trigger of a workflow.
pub fn add_path_filters(content: &str, rel: &str) -> Result<(String, PathFilterStatus)> {
    let doc: YamlValue = match serde_yaml::from_str(content) {
        Ok(doc) => doc,
        Err(_) => return heuristic_path_filter(content, rel),
    };

    match trigger_shape(&doc) {
        TriggerShape::Missing => Ok((content.to_string(), PathFilterStatus::NoPathTriggers)),
        TriggerShape::Events(events) => {
            let targets: Vec<String> = events
                .iter()
                .filter(|e| PATH_TRIGGERS.contains(&e.as_str()))
                .cloned()
                .collect();
            if targets.is_empty() {
                return Ok((content.to_string(), PathFilterStatus::NoPathTriggers));
            }

            // `on: push` or `on: [push, ...]` has nowhere to put a filter,
            // so the trigger list becomes a mapping.
            let mut map = Mapping::new();
            for event in events {
                let value = if targets.contains(&event) {
                    let mut trigger = Mapping::new();
                    trigger.insert(YamlValue::from("paths"), filter_value(rel));
                    YamlValue::Mapping(trigger)
                } else {
                    YamlValue::Null
                };
                map.insert(YamlValue::String(event), value);
            }
            let edited = replace_on_block(content, &YamlValue::Mapping(map))?;
            verify_filters(&doc, &edited, &targets, rel)?;
            Ok((edited, PathFilterStatus::Added(targets)))
        }
        TriggerShape::Mapping(map) => {
            let filtered = map
                .values()
                .any(|v| v.get("paths").is_some() || v.get("paths-ignore").is_some());
            if filtered {
                return Ok((content.to_string(), PathFilterStatus::AlreadyFiltered));
            }
            let targets: Vec<String> = PATH_TRIGGERS
                .iter()
                .filter(|t| map.contains_key(**t))
                .map(|t| t.to_string())
                .collect();
            if targets.is_empty() {
                return Ok((content.to_string(), PathFilterStatus::NoPathTriggers));
            }

            let edited = match insert_block_filters(content, &targets, rel)? {
                Some(text) => text,
                None => {
                    let mut rebuilt = map.clone();
                    for target in &targets {
                        let trigger = rebuilt
                            .get_mut(target.as_str())
                            .ok_or_else(|| merge_error(format!("lost trigger '{}'", target)))?;
                        if trigger.is_null() {
                            *trigger = YamlValue::Mapping(Mapping::new());
                        }
                        trigger
                            .as_mapping_mut()
                            .ok_or_else(|| {
                                merge_error(format!("trigger '{}' is not a mapping", target))
                            })?
                            .insert(YamlValue::from("paths"), filter_value(rel));
                    }
                    replace_on_block(content, &YamlValue::Mapping(rebuilt))?
                }
            };
            verify_filters(&doc, &edited, &targets, rel)?;
            Ok((edited, PathFilterStatus::Added(targets)))
        }
    }
}

/// Insert filters under the triggers of a block-style `on:` mapping.
///
/// Returns `None` when `on:` is not written as a block mapping.
fn insert_block_filters(content: &str, targets: &[String], rel: &str) -> Result<Option<String>> {
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    let Some((on_idx, on_rest)) = find_on_line(&lines)? else {
        return Ok(None);
    };
    if !inline_value(&on_rest).is_empty() {
        return Ok(None);
    }
    let end = block_extent(&lines, on_idx);
    let Some(child_indent) = lines[on_idx + 1..end]
        .iter()
        .find(|l| !is_blank_or_comment(l))
        .map(|l| indent_of(l))
    else {
        return Ok(None);
    };

    let glob = path_glob(rel);
    let mut replacements: BTreeMap<usize, String> = BTreeMap::new();
    let mut inserts: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for trigger in targets {
        let escaped = regex::escape(trigger);
        let trigger_re = Regex::new(&format!(
            r#"^(\s*(?:{t}|"{t}"|'{t}')\s*:)(.*)$"#,
            t = escaped
        ))?;
        let found = (on_idx + 1..end).find_map(|i| {
            if indent_of(&lines[i]) != child_indent {
                return None;
            }
            trigger_re
                .captures(&lines[i])
                .map(|c| (i, c[1].to_string(), c[2].to_string()))
        });
        let (idx, key, rest) =
            found.ok_or_else(|| merge_error(format!("could not locate '{}' trigger", trigger)))?;

        let value = inline_value(&rest);
        if value.is_empty() || value == "null" || value == "~" {
            if !value.is_empty() {
                replacements.insert(idx, key.clone());
            }
            let next = lines[idx + 1..end].iter().find(|l| !is_blank_or_comment(l));
            let indent = match next {
                Some(line) if value.is_empty() && indent_of(line) > child_indent => {
                    indent_of(line)
                }
                _ => child_indent + 2,
            };
            inserts.insert(
                idx,
                vec![
                    format!("{}paths:", spaces(indent)),
                    format!("{}- '{}'", spaces(indent + 2), glob),
                ],
            );
        } else if value.starts_with('{') {
            let flow = if value[1..].trim_start().starts_with('}') {
                rest.replacen(value, &format!("{{paths: ['{}']}}", glob), 1)
            } else {
                rest.replacen('{', &format!("{{paths: ['{}'], ", glob), 1)
            };
            replacements.insert(idx, format!("{}{}", key, flow));
        } else {
            return Err(merge_error(format!(
                "cannot add a path filter to '{}: {}'",
                trigger, value
            )));
        }
    }

    let mut edited = Vec::with_capacity(lines.len() + inserts.len() * 2);
    for (i, line) in lines.iter().enumerate() {
        edited.push(replacements.get(&i).cloned().unwrap_or_else(|| line.clone()));
        if let Some(extra) = inserts.get(&i) {
            edited.extend(extra.iter().cloned());
        }
    }
    Ok(Some(join_lines(&edited, content.ends_with('\n'))))
}

/// Replace the whole `on:` block with a freshly serialized value.
fn replace_on_block(content: &str, on_value: &YamlValue) -> Result<String> {
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    let (on_idx, _) = find_on_line(&lines)?
        .ok_or_else(|| merge_error("could not locate the top-level 'on:' key"))?;
    let end = block_extent(&lines, on_idx);

    let serialized = serde_yaml::to_string(on_value)
        .map_err(|e| merge_error(format!("Failed to serialize triggers: {}", e)))?;

    let mut edited: Vec<String> = lines[..on_idx].to_vec();
    edited.push("on:".to_string());
    edited.extend(serialized.lines().map(|l| format!("  {}", l)));
    edited.extend(lines[end..].iter().cloned());
    Ok(join_lines(&edited, content.ends_with('\n')))
}

/// Check that `edited` carries the filters and nothing else changed.
fn verify_filters(original: &YamlValue, edited: &str, targets: &[String], rel: &str) -> Result<()> {
    let edited_doc: YamlValue = serde_yaml::from_str(edited)
        .map_err(|e| merge_error(format!("edit produced invalid YAML: {}", e)))?;

    let glob = path_glob(rel);
    for target in targets {
        let has_filter = edited_doc
            .get("on")
            .and_then(|on| on.get(target.as_str()))
            .and_then(|t| t.get("paths"))
            .and_then(YamlValue::as_sequence)
            .is_some_and(|paths| paths.iter().any(|p| p.as_str() == Some(glob.as_str())));
        if !has_filter {
            return Err(merge_error(format!(
                "path filter for '{}' did not take effect",
                target
            )));
        }
    }

    let without_triggers = |doc: &YamlValue| {
        let mut doc = doc.clone();
        if let Some(map) = doc.as_mapping_mut() {
            map.remove("on");
        }
        doc
    };
    if without_triggers(original) != without_triggers(&edited_doc) {
        return Err(merge_error("edit changed more than the triggers"));
    }
    Ok(())
}

/// Line-pattern fallback for workflows that do not parse.
fn heuristic_path_filter(content: &str, rel: &str) -> Result<(String, PathFilterStatus)> {
    if content.contains("paths:") {
        return Ok((content.to_string(), PathFilterStatus::AlreadyFiltered));
    }
    let trigger_re = Regex::new(r"(on:\s*\n\s*(?:push|pull_request):)")?;
    if !trigger_re.is_match(content) {
        return Ok((
            content.to_string(),
            PathFilterStatus::Unfiltered("not valid YAML and no recognizable trigger".to_string()),
        ));
    }
    let replacement = format!("${{1}}\n    paths:\n      - '{}'", path_glob(rel));
    Ok((
        trigger_re
            .replace_all(content, replacement.as_str())
            .into_owned(),
        PathFilterStatus::Heuristic,
    ))
}

/// Line range `[start, end)` of the step whose keys sit at `key_col`.
fn step_extent(lines: &[String], uses_idx: usize, key_col: usize, dashed: bool) -> (usize, usize) {
    let mut start = uses_idx;
    if !dashed && key_col >= 2 {
        let mut j = uses_idx;
        while j > 0 {
            j -= 1;
            let line = &lines[j];
            if is_blank_or_comment(line) {
                continue;
            }
            let indent = indent_of(line);
            if indent >= key_col {
                start = j;
                continue;
            }
            if indent == key_col - 2 && line.trim_start().starts_with("- ") {
                start = j;
            }
            break;
        }
    }

    let mut end = uses_idx + 1;
    while end < lines.len() && (is_blank_or_comment(&lines[end]) || indent_of(&lines[end]) >= key_col) {
        end += 1;
    }
    while end > uses_idx + 1 && is_blank_or_comment(&lines[end - 1]) {
        end -= 1;
    }
    (start, end)
}

/// Give known preview-deployment actions a `path: <rel>` input.
///
/// Returns the edited text and the number of steps changed.
pub fn inject_preview_path(content: &str, actions: &[String], rel: &str) -> Result<(String, usize)> {
    if actions.is_empty() {
        return Ok((content.to_string(), 0));
    }
    let uses_re = Regex::new(r#"^(\s*)(-\s+)?uses\s*:\s*["']?([^"'\s#]+)["']?\s*(?:#.*)?$"#)?;
    let with_re = Regex::new(r"^(\s*)(-\s+)?with\s*:(.*)$")?;
    let path_key_re = Regex::new(r"^\s*path\s*:")?;
    let flow_path_re = Regex::new(r"[{,]\s*path\s*:")?;

    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let mut injected = 0;
    let mut i = 0;

    while i < lines.len() {
        let matched = uses_re.captures(&lines[i]).and_then(|caps| {
            let action = caps[3].split('@').next().unwrap_or_default().to_string();
            let dash = caps.get(2).map_or(0, |m| m.as_str().len());
            actions
                .iter()
                .any(|a| *a == action)
                .then(|| (caps[1].len() + dash, dash > 0))
        });
        let Some((key_col, dashed)) = matched else {
            i += 1;
            continue;
        };

        let (start, end) = step_extent(&lines, i, key_col, dashed);
        let with_line = (start..end).find_map(|k| {
            with_re.captures(&lines[k]).and_then(|c| {
                let col = c[1].len() + c.get(2).map_or(0, |m| m.as_str().len());
                (col == key_col).then(|| (k, c[3].to_string()))
            })
        });

        match with_line {
            Some((k, rest)) => {
                let value = inline_value(&rest).to_string();
                if value.is_empty() {
                    let children: Vec<usize> = (k + 1..end)
                        .filter(|&c| !is_blank_or_comment(&lines[c]) && indent_of(&lines[c]) > key_col)
                        .collect();
                    let child_indent = children
                        .first()
                        .map(|&c| indent_of(&lines[c]))
                        .unwrap_or(key_col + 2);
                    let has_path = children.iter().any(|&c| {
                        indent_of(&lines[c]) == child_indent && path_key_re.is_match(&lines[c])
                    });
                    if !has_path {
                        lines.insert(k + 1, format!("{}path: {}", spaces(child_indent), rel));
                        injected += 1;
                    }
                } else if value.starts_with('{') && !flow_path_re.is_match(&value) {
                    let (head, tail) = lines[k].split_at(lines[k].len() - rest.len());
                    let tail = if value[1..].trim_start().starts_with('}') {
                        tail.replacen(value.as_str(), &format!("{{path: {}}}", rel), 1)
                    } else {
                        tail.replacen('{', &format!("{{path: {}, ", rel), 1)
                    };
                    let replaced = format!("{}{}", head, tail);
                    lines[k] = replaced;
                    injected += 1;
                }
            }
            None => {
                lines.insert(i + 1, format!("{}with:", spaces(key_col)));
                lines.insert(i + 2, format!("{}path: {}", spaces(key_col + 2), rel));
                injected += 1;
            }
        }
        i += 1;
    }

    let edited = join_lines(&lines, content.ends_with('\n'));
    if injected > 0
        && serde_yaml::from_str::<YamlValue>(content).is_ok()
        && serde_yaml::from_str::<YamlValue>(&edited).is_err()
    {
        return Err(merge_error("preview action edit produced invalid YAML"));
    }
    Ok((edited, injected))
}

/// Scope one workflow to the project at `rel`.
///
/// Line endings are normalized to `\n`. Never fails: problems are carried
/// in the returned statuses and the affected edit is skipped.
pub fn rewrite_workflow(content: &str, rel: &str, preview_actions: &[String]) -> RewrittenWorkflow {
    let content = content.replace("\r\n", "\n");
    let (filtered, filter) = match add_path_filters(&content, rel) {
        Ok(result) => result,
        Err(e) => (
            content.clone(),
            PathFilterStatus::Unfiltered(e.to_string()),
        ),
    };
    match inject_preview_path(&filtered, preview_actions, rel) {
        Ok((content, previews)) => RewrittenWorkflow {
            content,
            filter,
            previews,
            preview_error: None,
        },
        Err(e) => RewrittenWorkflow {
            content: filtered,
            filter,
            previews: 0,
            preview_error: Some(e.to_string()),
        },
    }
}

fn workflow_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.y*ml", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml") | Some("yaml")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Move `<project>/.github/workflows/*` to the monorepo root, scoped to `rel`.
///
/// `<project>/.github` is removed afterwards; anything in it that is not a
/// workflow is reported as discarded. A workflow that cannot be read as text
/// is reported and the whole directory is kept for review.
pub fn migrate(
    project: &Path,
    root: &Path,
    rel: &str,
    project_name: &str,
    preview_actions: &[String],
    report: &mut Report,
) -> Result<MergeOutcome> {
    let github_dir = project.join(GITHUB_DIR);
    if !github_dir.is_dir() {
        return Ok(MergeOutcome::Absent);
    }

    let sources = workflow_files(&github_dir.join("workflows"))?;
    let mut migrated: HashSet<PathBuf> = HashSet::new();
    let mut written = 0;
    let mut unchanged = 0;
    let mut unreadable = 0;

    for source in &sources {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = match read_fragment(source, OPERATION) {
            Ok(Some(content)) => content,
            Ok(None) => continue,
            Err(e) => {
                report.warn(
                    WarningKind::Merge,
                    format!("{}/{}/{}", rel, WORKFLOWS_DIR, file_name),
                    format!("not migrated: {}", e),
                );
                unreadable += 1;
                continue;
            }
        };
        let rewritten = rewrite_workflow(&content, rel, preview_actions);

        let target_rel = format!("{}/{}-{}", WORKFLOWS_DIR, project_name, file_name);
        let target = root.join(&target_rel);
        let existing = read_fragment(&target, OPERATION)?;

        if existing.as_deref() == Some(rewritten.content.as_str()) {
            unchanged += 1;
        } else {
            if existing.is_some() {
                report.warn(
                    WarningKind::Merge,
                    target_rel.as_str(),
                    "replaced an existing workflow with the same name",
                );
            }
            write_target(&target, &rewritten.content, OPERATION)?;
            written += 1;
        }
        migrated.insert(source.clone());

        let mut detail = format!(
            "from {}/{}/{}; {}",
            rel,
            WORKFLOWS_DIR,
            file_name,
            rewritten.filter.describe()
        );
        if rewritten.previews > 0 {
            detail.push_str(&format!("; {} preview action(s) scoped", rewritten.previews));
        }
        report.record(Action::Moved, target_rel.as_str(), detail);

        if let PathFilterStatus::Unfiltered(reason) = &rewritten.filter {
            report.warn(
                WarningKind::Merge,
                target_rel.as_str(),
                format!("migrated without a path filter: {}", reason),
            );
        }
        if let Some(reason) = &rewritten.preview_error {
            report.warn(
                WarningKind::Merge,
                target_rel.as_str(),
                format!("preview action left unscoped: {}", reason),
            );
        }
    }

    if unreadable > 0 {
        report.kept(
            format!("{}/{}", rel, GITHUB_DIR),
            "holds workflows that could not be migrated",
        );
        return Ok(MergeOutcome::Merged(format!(
            "{} workflow(s) migrated, {} already present, {} left in the project",
            written, unchanged, unreadable
        )));
    }

    for entry in WalkDir::new(&github_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        if migrated.contains(entry.path()) {
            continue;
        }
        let shown = entry
            .path()
            .strip_prefix(project)
            .map(|p| format!("{}/{}", rel, crate::path::to_slash(p)))
            .unwrap_or_else(|_| entry.path().display().to_string());
        report.removed(shown, "discarded, not a workflow");
    }

    remove_fragment(&github_dir, OPERATION)?;

    Ok(if written > 0 {
        MergeOutcome::Merged(format!(
            "{} workflow(s) migrated, {} already present",
            written, unchanged
        ))
    } else {
        MergeOutcome::Unchanged(format!("{} workflow(s) already present", unchanged))
    })
}
