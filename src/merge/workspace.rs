//! Root `package.json` workspace registration
//!
//! The project directory is added to the `workspaces` list of the monorepo
//! manifest. Both the array form and the `{ "packages": [...] }` form are
//! understood. Key order and the manifest's indentation are preserved.

use super::{read_fragment, write_target, MergeOutcome};
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

pub const PACKAGE_JSON: &str = "package.json";

const OPERATION: &str = "workspace registration";

fn merge_error(message: impl Into<String>) -> Error {
    Error::Merge {
        operation: OPERATION.to_string(),
        message: message.into(),
    }
}

/// Compare workspace entries without `./` prefixes or trailing slashes.
fn normalize_entry(entry: &str) -> &str {
    entry.trim_start_matches("./").trim_end_matches('/')
}

/// Indentation of the first indented line, two spaces if there is none.
fn detect_indent(content: &str) -> String {
    content
        .lines()
        .skip(1)
        .map(|line| {
            line.chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect::<String>()
        })
        .find(|indent| !indent.is_empty())
        .unwrap_or_else(|| "  ".to_string())
}

fn to_pretty(doc: &JsonValue, indent: &str) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut serializer)?;
    let mut text = String::from_utf8(buf).map_err(|e| merge_error(e.to_string()))?;
    text.push('\n');
    Ok(text)
}

fn workspace_list(manifest: &mut Map<String, JsonValue>) -> Result<&mut Vec<JsonValue>> {
    if matches!(manifest.get("workspaces"), None | Some(JsonValue::Null)) {
        manifest.insert("workspaces".to_string(), JsonValue::Array(Vec::new()));
    }
    match manifest.get_mut("workspaces") {
        Some(JsonValue::Array(list)) => Ok(list),
        Some(JsonValue::Object(nested)) => match nested
            .entry("packages")
            .or_insert_with(|| JsonValue::Array(Vec::new()))
        {
            JsonValue::Array(list) => Ok(list),
            _ => Err(merge_error("'workspaces.packages' is not an array")),
        },
        _ => Err(merge_error("'workspaces' is neither an array nor an object")),
    }
}

/// Add `rel` to the workspaces of a manifest.
///
/// Returns `None` when the entry is already listed.
pub fn register(manifest: &str, rel: &str) -> Result<Option<String>> {
    let mut doc: JsonValue = serde_json::from_str(manifest)
        .map_err(|e| merge_error(format!("Failed to parse root package.json: {}", e)))?;
    let object = doc
        .as_object_mut()
        .ok_or_else(|| merge_error("root package.json is not an object"))?;

    let list = workspace_list(object)?;
    let wanted = normalize_entry(rel);
    if list
        .iter()
        .filter_map(JsonValue::as_str)
        .any(|entry| normalize_entry(entry) == wanted)
    {
        return Ok(None);
    }
    list.push(JsonValue::String(wanted.to_string()));

    to_pretty(&doc, &detect_indent(manifest)).map(Some)
}

/// Register `rel` in `<root>/package.json`.
pub fn register_in(root: &Path, rel: &str) -> Result<MergeOutcome> {
    let target = root.join(PACKAGE_JSON);
    let Some(manifest) = read_fragment(&target, OPERATION)? else {
        return Ok(MergeOutcome::NotApplicable(
            "no root package.json; add the project to your workspace manually".to_string(),
        ));
    };

    match register(&manifest, rel)? {
        Some(updated) => {
            write_target(&target, &updated, OPERATION)?;
            Ok(MergeOutcome::Merged(format!("added {} to workspaces", rel)))
        }
        None => Ok(MergeOutcome::Unchanged(format!(
            "{} already listed in workspaces",
            rel
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_register_appends_to_array() {
        let manifest = "{\n  \"name\": \"mono\",\n  \"private\": true,\n  \"workspaces\": [\"packages/a\"]\n}\n";
        let updated = register(manifest, "packages/my-tool").unwrap().unwrap();
        assert_eq!(
            updated,
            "{\n  \"name\": \"mono\",\n  \"private\": true,\n  \"workspaces\": [\n    \"packages/a\",\n    \"packages/my-tool\"\n  ]\n}\n"
        );
    }

    #[test]
    fn test_register_creates_workspaces() {
        let updated = register("{\"name\": \"mono\"}", "apps/web").unwrap().unwrap();
        let doc: JsonValue = serde_json::from_str(&updated).unwrap();
        assert_eq!(doc["workspaces"], serde_json::json!(["apps/web"]));
        assert!(updated.ends_with("}\n"));
    }

    #[test]
    fn test_register_object_form() {
        let manifest = r#"{"workspaces": {"packages": ["libs/*"], "nohoist": ["**/x"]}}"#;
        let updated = register(manifest, "packages/my-tool").unwrap().unwrap();
        let doc: JsonValue = serde_json::from_str(&updated).unwrap();
        assert_eq!(
            doc["workspaces"]["packages"],
            serde_json::json!(["libs/*", "packages/my-tool"])
        );
        assert_eq!(doc["workspaces"]["nohoist"], serde_json::json!(["**/x"]));
    }

    #[test]
    fn test_register_already_listed() {
        let manifest = r#"{"workspaces": ["./packages/my-tool/"]}"#;
        assert!(register(manifest, "packages/my-tool").unwrap().is_none());
    }

    #[test]
    fn test_register_keeps_indent_and_key_order() {
        let manifest = "{\n\t\"name\": \"mono\",\n\t\"devDependencies\": {},\n\t\"workspaces\": []\n}\n";
        let updated = register(manifest, "p").unwrap().unwrap();
        assert!(updated.starts_with("{\n\t\"name\": \"mono\",\n\t\"devDependencies\": {},\n"));
    }

    #[test]
    fn test_register_rejects_bad_shape() {
        assert!(register(r#"{"workspaces": "packages/*"}"#, "p").is_err());
        assert!(register("[]", "p").is_err());
        assert!(register("{not json", "p").is_err());
    }

    #[test]
    fn test_register_in_twice() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PACKAGE_JSON), "{\"workspaces\": []}\n").unwrap();

        assert!(register_in(temp.path(), "packages/x").unwrap().is_merged());
        let after_first = fs::read_to_string(temp.path().join(PACKAGE_JSON)).unwrap();
        assert!(matches!(
            register_in(temp.path(), "packages/x").unwrap(),
            MergeOutcome::Unchanged(_)
        ));
        assert_eq!(
            fs::read_to_string(temp.path().join(PACKAGE_JSON)).unwrap(),
            after_first
        );
    }

    #[test]
    fn test_register_in_without_manifest() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            register_in(temp.path(), "packages/x").unwrap(),
            MergeOutcome::NotApplicable(_)
        ));
        assert!(!temp.path().join(PACKAGE_JSON).exists());
    }
}
