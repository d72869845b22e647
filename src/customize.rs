//! Placeholder substitution for cloned templates
//!
//! A `github-template` is a plain repository, so its files carry literal
//! `{key}` placeholders rather than template syntax. Only the configured
//! customizable files are rewritten. `package.json` is edited structurally so
//! that a placeholder can never break its JSON.

use crate::error::{Error, Result};
use crate::filesystem::{ensure_trailing_newline, read_optional, write_atomic};
use crate::path::substitute_placeholders;
use crate::report::{Action, Report, WarningKind};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;

const PACKAGE_JSON: &str = "package.json";

/// Placeholder values for one customization pass.
#[derive(Debug, Clone)]
pub struct Customizations {
    slug: String,
    values: BTreeMap<String, String>,
}

impl Customizations {
    /// Combine configured values with the project's name and slug.
    ///
    /// `project_name` and `project_slug` always reflect the project being
    /// created, even if the configuration defines them.
    pub fn new(configured: &BTreeMap<String, String>, name: &str, slug: &str) -> Self {
        let mut values = configured.clone();
        values.insert("project_name".to_string(), name.to_string());
        values.insert("project_slug".to_string(), slug.to_string());
        Self {
            slug: slug.to_string(),
            values,
        }
    }

    fn apply(&self, text: &str) -> String {
        substitute_placeholders(
            text,
            self.values.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }
}

/// Rewrite every customizable file present under `project`.
///
/// Missing files are ignored. A file that cannot be read as text, or a
/// `package.json` that fails to parse, is left alone and reported as a
/// warning.
pub fn customize_tree(
    project: &Path,
    files: &[String],
    customizations: &Customizations,
    report: &mut Report,
) -> Result<()> {
    for name in files {
        let path = project.join(name);
        let content = match read_optional(&path) {
            Ok(Some(content)) => content,
            Ok(None) => continue,
            Err(e) => {
                report.warn(
                    WarningKind::Acquisition,
                    name.as_str(),
                    format!("left unchanged: {}", e),
                );
                continue;
            }
        };

        let is_manifest = Path::new(name).file_name().and_then(|f| f.to_str()) == Some(PACKAGE_JSON);
        let rewritten = if is_manifest {
            match customize_package_json(&content, customizations) {
                Ok(text) => text,
                Err(e) => {
                    report.warn(
                        WarningKind::Acquisition,
                        name.as_str(),
                        format!("left unchanged: {}", e),
                    );
                    continue;
                }
            }
        } else {
            customizations.apply(&content)
        };

        if rewritten != content {
            write_atomic(&path, &rewritten)?;
            report.record(Action::Customized, name.as_str(), "placeholders replaced");
        }
    }
    Ok(())
}

/// Set `name` to the slug and substitute placeholders in string values.
pub fn customize_package_json(content: &str, customizations: &Customizations) -> Result<String> {
    let mut manifest: JsonValue = serde_json::from_str(content).map_err(|e| Error::Merge {
        operation: "package.json customization".to_string(),
        message: format!("Failed to parse JSON: {}", e),
    })?;

    substitute_strings(&mut manifest, customizations);
    if let Some(object) = manifest.as_object_mut() {
        object.insert(
            "name".to_string(),
            JsonValue::String(customizations.slug.clone()),
        );
    }

    let serialized = serde_json::to_string_pretty(&manifest)?;
    Ok(ensure_trailing_newline(serialized))
}

fn substitute_strings(value: &mut JsonValue, customizations: &Customizations) {
    match value {
        JsonValue::String(s) => *s = customizations.apply(s),
        JsonValue::Array(items) => items
            .iter_mut()
            .for_each(|item| substitute_strings(item, customizations)),
        JsonValue::Object(map) => map
            .values_mut()
            .for_each(|item| substitute_strings(item, customizations)),
        _ => {}
    }
}
