//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

/// Generate an error for when the template configuration file is not found.
///
/// Includes hints about:
/// - Creating the configuration file
/// - Using the -c/--config flag
/// - Pointing at a different monorepo root
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create .monorepo/project-templates.yaml in your monorepo root\n\
         hint: Use -c/--config (or ADD_PROJECT_CONFIG) to specify a different path\n\
         hint: Use --root (or ADD_PROJECT_ROOT) if you are outside the monorepo",
        path = path.display()
    )
}

/// Generate an error for a template tool that could not be started.
///
/// Includes hints about installing or overriding the tool.
pub fn tool_not_found(tool: &str, error: &std::io::Error) -> String {
    format!(
        "could not run '{tool}': {error}\n\
         hint: Make sure '{tool}' is installed and on PATH\n\
         hint: Override the command under 'tools:' in the template configuration"
    )
}

/// Generate the follow-up message for a failed dependency sync.
pub fn sync_failed(command: &str) -> String {
    format!("Run '{command}' manually from the monorepo root once the problem is fixed")
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
pub fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Single rolling row: previous[j] is the distance between a[..i-1] and b[..j]
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
