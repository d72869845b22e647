//! `.gitattributes` merge
//!
//! Project rules are rewritten so their patterns are anchored at the
//! project's directory and then appended to the monorepo file under a
//! `# Attributes from <rel>` header. Rules already present in the monorepo
//! file are not appended again.

use super::{read_fragment, remove_fragment, write_target, MergeOutcome};
use crate::error::Result;
use std::collections::HashSet;
use std::path::Path;

pub const ATTRIBUTES_FILE: &str = ".gitattributes";

const OPERATION: &str = "gitattributes merge";

/// Rewrite one project's attribute rules for the monorepo root.
///
/// Blank lines are dropped, comments pass through verbatim, `pattern attrs`
/// lines get `rel/` prefixed to the pattern and lines without an attribute
/// part are kept as they are. Macro definitions (`[attr]name ...`) are only
/// valid at the repository root, so they are kept unprefixed.
pub fn prefix_rules(content: &str, rel: &str) -> Vec<String> {
    let rel = rel.trim_end_matches('/');
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.starts_with("[attr]") {
                return line.to_string();
            }
            match trimmed.split_once(char::is_whitespace) {
                Some((pattern, attrs)) => {
                    format!("{} {}", prefix_pattern(pattern, rel), attrs.trim_start())
                }
                None => line.to_string(),
            }
        })
        .collect()
}

fn prefix_pattern(pattern: &str, rel: &str) -> String {
    match pattern.strip_prefix('"') {
        Some(quoted) => format!("\"{}/{}", rel, quoted.trim_start_matches('/')),
        None => format!("{}/{}", rel, pattern.trim_start_matches('/')),
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Append prefixed rules to the monorepo's attribute file content.
///
/// Returns `None` when every rule is already present, in which case the
/// monorepo file must be left alone.
pub fn merge_rules(existing: &str, rules: &[String], rel: &str) -> Option<String> {
    let present: HashSet<&str> = existing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    let fresh: Vec<&String> = rules
        .iter()
        .filter(|rule| is_comment(rule) || !present.contains(rule.trim()))
        .collect();
    if !fresh.iter().any(|rule| !is_comment(rule)) {
        return None;
    }

    let mut merged = existing.trim_end().to_string();
    if !merged.is_empty() {
        merged.push_str("\n\n");
    }
    merged.push_str(&format!("# Attributes from {}\n", rel.trim_end_matches('/')));
    for rule in fresh {
        merged.push_str(rule);
        merged.push('\n');
    }
    Some(merged)
}

/// Merge `<project>/.gitattributes` into `<root>/.gitattributes`.
///
/// The project copy is removed whenever it was present, including when it
/// contributed nothing new.
pub fn merge_into(project: &Path, root: &Path, rel: &str) -> Result<MergeOutcome> {
    let source = project.join(ATTRIBUTES_FILE);
    let Some(content) = read_fragment(&source, OPERATION)? else {
        return Ok(MergeOutcome::Absent);
    };

    let rules = prefix_rules(&content, rel);
    let rule_count = rules.iter().filter(|r| !r.starts_with('#')).count();

    let target = root.join(ATTRIBUTES_FILE);
    let existing = read_fragment(&target, OPERATION)?.unwrap_or_default();

    let outcome = match merge_rules(&existing, &rules, rel) {
        Some(merged) => {
            write_target(&target, &merged, OPERATION)?;
            MergeOutcome::Merged(format!("{} rule(s) scoped to {}/", rule_count, rel))
        }
        None if rule_count == 0 => MergeOutcome::Unchanged("no rules to merge".to_string()),
        None => MergeOutcome::Unchanged(format!("all rules for {}/ already present", rel)),
    };

    remove_fragment(&source, OPERATION)?;
    Ok(outcome)
}
