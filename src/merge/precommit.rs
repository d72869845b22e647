//! `.pre-commit-config.yaml` merge
//!
//! Hooks from the project are scoped to the project directory with a `files`
//! pattern, then folded into the monorepo document. Repository blocks are
//! matched by their `repo` value and hooks by their `id`, so merging the same
//! project twice adds nothing.

use super::{read_fragment, remove_fragment, write_target, MergeOutcome};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value as YamlValue};
use std::path::Path;

pub const PRECOMMIT_FILE: &str = ".pre-commit-config.yaml";

const OPERATION: &str = "pre-commit merge";

/// Counts gathered while merging one project document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookMergeStats {
    pub added_repos: usize,
    pub added_hooks: usize,
    /// Hook ids not added because the monorepo already has them.
    pub existing_hooks: Vec<String>,
}

impl HookMergeStats {
    pub fn changed(&self) -> bool {
        self.added_repos > 0 || self.added_hooks > 0
    }
}

fn merge_error(message: impl Into<String>) -> Error {
    Error::Merge {
        operation: OPERATION.to_string(),
        message: message.into(),
    }
}

/// The `repos` list of a document; a missing list is empty.
fn repos_of(doc: &YamlValue, which: &str) -> Result<Vec<YamlValue>> {
    match doc.get("repos") {
        None | Some(YamlValue::Null) => Ok(Vec::new()),
        Some(YamlValue::Sequence(repos)) => Ok(repos.clone()),
        Some(_) => Err(merge_error(format!("'repos' in {} is not a list", which))),
    }
}

/// Give every hook without a `files` filter the pattern `^<rel>/`.
pub fn scope_hooks(repos: &mut [YamlValue], rel: &str) {
    let pattern = YamlValue::String(format!("^{}/", rel.trim_end_matches('/')));
    for hook in repos
        .iter_mut()
        .filter_map(|repo| repo.get_mut("hooks"))
        .filter_map(YamlValue::as_sequence_mut)
        .flat_map(|hooks| hooks.iter_mut())
        .filter_map(YamlValue::as_mapping_mut)
    {
        if !hook.contains_key("files") {
            hook.insert(YamlValue::from("files"), pattern.clone());
        }
    }
}

fn hook_ids(block: &YamlValue) -> Vec<YamlValue> {
    block
        .get("hooks")
        .and_then(YamlValue::as_sequence)
        .map(|hooks| hooks.iter().filter_map(|h| h.get("id").cloned()).collect())
        .unwrap_or_default()
}

fn describe(value: &YamlValue) -> String {
    match value {
        YamlValue::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Merge project repo blocks (already scoped) into the monorepo document.
pub fn merge_documents(monorepo: &mut YamlValue, project_repos: Vec<YamlValue>) -> Result<HookMergeStats> {
    if monorepo.is_null() {
        *monorepo = YamlValue::Mapping(Mapping::new());
    }
    let doc = monorepo
        .as_mapping_mut()
        .ok_or_else(|| merge_error("monorepo pre-commit config is not a mapping"))?;
    let repos = doc
        .entry(YamlValue::from("repos"))
        .or_insert_with(|| YamlValue::Sequence(Vec::new()));
    if repos.is_null() {
        *repos = YamlValue::Sequence(Vec::new());
    }
    let repos = repos
        .as_sequence_mut()
        .ok_or_else(|| merge_error("'repos' in monorepo pre-commit config is not a list"))?;

    let mut stats = HookMergeStats::default();
    for block in project_repos {
        let key = block.get("repo").cloned();
        let existing = key
            .as_ref()
            .and_then(|key| repos.iter_mut().find(|r| r.get("repo") == Some(key)));

        match existing {
            Some(target) => {
                let known = hook_ids(target);
                let new_hooks: Vec<YamlValue> = block
                    .get("hooks")
                    .and_then(YamlValue::as_sequence)
                    .cloned()
                    .unwrap_or_default();
                let target_map = target
                    .as_mapping_mut()
                    .ok_or_else(|| merge_error("repo entry is not a mapping"))?;
                let hooks = target_map
                    .entry(YamlValue::from("hooks"))
                    .or_insert_with(|| YamlValue::Sequence(Vec::new()));
                if hooks.is_null() {
                    *hooks = YamlValue::Sequence(Vec::new());
                }
                let hooks = hooks
                    .as_sequence_mut()
                    .ok_or_else(|| merge_error("'hooks' is not a list"))?;

                for hook in new_hooks {
                    let duplicate = hook
                        .get("id")
                        .filter(|id| known.contains(id))
                        .map(describe);
                    match duplicate {
                        Some(id) => stats.existing_hooks.push(id),
                        None => {
                            hooks.push(hook);
                            stats.added_hooks += 1;
                        }
                    }
                }
            }
            None => {
                stats.added_hooks += hook_ids(&block).len();
                stats.added_repos += 1;
                repos.push(block);
            }
        }
    }
    Ok(stats)
}

/// Merge `<project>/.pre-commit-config.yaml` into the monorepo's.
pub fn merge_into(project: &Path, root: &Path, rel: &str) -> Result<MergeOutcome> {
    let source = project.join(PRECOMMIT_FILE);
    let Some(content) = read_fragment(&source, OPERATION)? else {
        return Ok(MergeOutcome::Absent);
    };
    let project_doc: YamlValue = serde_yaml::from_str(&content)
        .map_err(|e| merge_error(format!("Failed to parse project config: {}", e)))?;
    let mut project_repos = repos_of(&project_doc, "project config")?;
    scope_hooks(&mut project_repos, rel);

    let target = root.join(PRECOMMIT_FILE);
    let mut monorepo_doc: YamlValue = match read_fragment(&target, OPERATION)? {
        Some(existing) => serde_yaml::from_str(&existing)
            .map_err(|e| merge_error(format!("Failed to parse monorepo config: {}", e)))?,
        None => YamlValue::Null,
    };

    let stats = merge_documents(&mut monorepo_doc, project_repos)?;
    let mut detail = format!(
        "{} repo(s), {} hook(s) scoped to ^{}/",
        stats.added_repos, stats.added_hooks, rel
    );
    if !stats.existing_hooks.is_empty() {
        detail.push_str(&format!(
            " (already present: {})",
            stats.existing_hooks.join(", ")
        ));
    }

    let outcome = if stats.changed() {
        let serialized = serde_yaml::to_string(&monorepo_doc)
            .map_err(|e| merge_error(format!("Failed to serialize YAML: {}", e)))?;
        write_target(&target, &serialized, OPERATION)?;
        MergeOutcome::Merged(detail)
    } else {
        MergeOutcome::Unchanged(detail)
    };

    remove_fragment(&source, OPERATION)?;
    Ok(outcome)
}
