//! Project identifiers and slug derivation
//!
//! A project is named by the user with a free-form display name ("My Tool").
//! Everything that touches the filesystem or a template engine uses the
//! derived slug instead ("my-tool").

use std::fmt;

/// Slug used when nothing usable survives normalization.
pub const FALLBACK_SLUG: &str = "my-project";

/// A project's display name together with its derived slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentifier {
    name: String,
    slug: String,
}

impl ProjectIdentifier {
    /// Build an identifier from a user-supplied display name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = derive_slug(&name);
        Self { name, slug }
    }

    /// The name exactly as the user typed it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized, filesystem-safe form of the name.
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl fmt::Display for ProjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.slug)
    }
}

/// Derive a slug from a display name.
///
/// The result is lowercase ASCII, uses single hyphens as separators, starts
/// with a letter and never ends with a hyphen. Any character outside
/// `[a-z0-9]` becomes a separator. Inputs with no letters at all map to
/// [`FALLBACK_SLUG`].
///
/// # Examples
///
/// ```
/// use add_project::slug::derive_slug;
///
/// assert_eq!(derive_slug("My Tool"), "my-tool");
/// assert_eq!(derive_slug("user_service.v2"), "user-service-v2");
/// assert_eq!(derive_slug("42 things"), "things");
/// ```
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            // Leading digits are dropped so the slug starts with a letter
            if slug.is_empty() && !ch.is_ascii_lowercase() {
                continue;
            }
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Check whether a string already satisfies the slug invariants.
pub fn is_valid_slug(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    !candidate.ends_with('-')
        && !candidate.contains("--")
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_slug_spaces_and_case() {
        assert_eq!(derive_slug("My Tool"), "my-tool");
        assert_eq!(derive_slug("User Service"), "user-service");
    }

    #[test]
    fn test_derive_slug_separators_collapse() {
        assert_eq!(derive_slug("shared__utils"), "shared-utils");
        assert_eq!(derive_slug("a / b \\ c"), "a-b-c");
        assert_eq!(derive_slug("api.gateway"), "api-gateway");
    }

    #[test]
    fn test_derive_slug_strips_edges() {
        assert_eq!(derive_slug("--my-tool--"), "my-tool");
        assert_eq!(derive_slug("  tool  "), "tool");
        assert_eq!(derive_slug("tool!"), "tool");
    }

    #[test]
    fn test_derive_slug_must_start_with_letter() {
        assert_eq!(derive_slug("3d-viewer"), "d-viewer");
        assert_eq!(derive_slug("_private"), "private");
    }

    #[test]
    fn test_derive_slug_keeps_inner_digits() {
        assert_eq!(derive_slug("Service 2"), "service-2");
        assert_eq!(derive_slug("v8 bindings"), "v8-bindings");
    }

    #[test]
    fn test_derive_slug_non_ascii_becomes_separator() {
        assert_eq!(derive_slug("Café Über"), "caf-ber");
    }

    #[test]
    fn test_derive_slug_fallback() {
        assert_eq!(derive_slug(""), FALLBACK_SLUG);
        assert_eq!(derive_slug("123"), FALLBACK_SLUG);
        assert_eq!(derive_slug("---"), FALLBACK_SLUG);
    }

    #[test]
    fn test_identifier_exposes_name_and_slug() {
        let ident = ProjectIdentifier::new("My Tool");
        assert_eq!(ident.name(), "My Tool");
        assert_eq!(ident.slug(), "my-tool");
        assert_eq!(ident.to_string(), "My Tool (my-tool)");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("my-tool"));
        assert!(is_valid_slug("a"));
        assert!(is_valid_slug("tool2"));
        assert!(!is_valid_slug("-tool"));
        assert!(!is_valid_slug("tool-"));
        assert!(!is_valid_slug("my--tool"));
        assert!(!is_valid_slug("2tool"));
        assert!(!is_valid_slug("My-Tool"));
        assert!(!is_valid_slug(""));
    }
}
