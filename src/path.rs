//! Path manipulation utilities for add-project

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Express `path` relative to `base` using forward slashes.
///
/// This is the form written into monorepo configuration files
/// (`packages/my-tool`), independent of the host platform.
pub fn repo_relative(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| Error::Path {
        message: format!(
            "{} is not inside {}",
            path.display(),
            base.display()
        ),
    })?;
    Ok(to_slash(relative))
}

/// Join path components with `/`.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// The relative path that climbs from `rel` back to its base.
///
/// `packages/my-tool` yields `../..`. An empty path yields `.`.
pub fn path_to_root(rel: &str) -> String {
    let depth = rel.split('/').filter(|s| !s.is_empty() && *s != ".").count();
    if depth == 0 {
        ".".to_string()
    } else {
        vec![".."; depth].join("/")
    }
}

/// Replace every `{key}` placeholder in `text` with its value.
pub fn substitute_placeholders<'a, I>(text: &str, values: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    values
        .into_iter()
        .fold(text.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), value)
        })
}

/// Resolve `relative` under `base`, rejecting anything that escapes it.
pub fn join_within(base: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(Error::Path {
            message: format!("'{}' must be a relative path without '..'", relative),
        });
    }
    Ok(base.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_relative() {
        let base = Path::new("/work/mono");
        let path = Path::new("/work/mono/packages/my-tool");
        assert_eq!(repo_relative(base, path).unwrap(), "packages/my-tool");
        assert!(repo_relative(base, Path::new("/elsewhere")).is_err());
    }

    #[test]
    fn test_path_to_root() {
        assert_eq!(path_to_root("packages/my-tool"), "../..");
        assert_eq!(path_to_root("apps/web/frontend"), "../../..");
        assert_eq!(path_to_root("tool"), "..");
        assert_eq!(path_to_root(""), ".");
        assert_eq!(path_to_root("./packages/x/"), "../..");
    }

    #[test]
    fn test_substitute_placeholders() {
        let out = substitute_placeholders(
            "# {project_name}\n{description} ({project_slug}) {unknown}",
            [
                ("project_name", "My Tool"),
                ("project_slug", "my-tool"),
                ("description", "Does things"),
            ],
        );
        assert_eq!(out, "# My Tool\nDoes things (my-tool) {unknown}");
    }

    #[test]
    fn test_join_within() {
        let base = Path::new("/mono");
        assert_eq!(
            join_within(base, "packages/x").unwrap(),
            PathBuf::from("/mono/packages/x")
        );
        assert!(join_within(base, "../x").is_err());
        assert!(join_within(base, "/etc").is_err());
    }
}
