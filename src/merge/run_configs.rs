//! IDE run configurations for npm scripts
//!
//! For each well-known script in the project's `package.json` a shared run
//! configuration is written to `<root>/.run/`, so the scripts show up as
//! launchers in JetBrains IDEs without any manual setup.

use super::{read_fragment, write_target, MergeOutcome};
use crate::config::RunScript;
use crate::error::{Error, Result};
use serde_json::Value as JsonValue;
use std::path::Path;

pub const RUN_DIR: &str = ".run";

const OPERATION: &str = "run configurations";

/// File name of one configuration, e.g. `my-tool__Tests_Watch.run.xml`.
pub fn config_file_name(project: &str, label: &str) -> String {
    let safe: String = label
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    format!("{}__{}.run.xml", project, safe)
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// XML for running `npm run <script>` in the project at `rel`.
pub fn render(project: &str, rel: &str, script: &str, label: &str) -> String {
    format!(
        r#"<component name="ProjectRunConfigurationManager">
  <configuration default="false" name="{name}" type="js.build_tools.npm">
    <package-json value="$PROJECT_DIR$/{rel}/package.json" />
    <command value="run" />
    <scripts>
      <script value="{script}" />
    </scripts>
    <node-interpreter value="project" />
    <envs />
    <method v="2" />
  </configuration>
</component>
"#,
        name = escape_attr(&format!("{}: {}", project, label)),
        rel = escape_attr(rel.trim_end_matches('/')),
        script = escape_attr(script),
    )
}

/// Script names declared in a `package.json`.
pub fn declared_scripts(manifest: &str) -> Result<Vec<String>> {
    let doc: JsonValue = serde_json::from_str(manifest).map_err(|e| Error::Merge {
        operation: OPERATION.to_string(),
        message: format!("Failed to parse package.json: {}", e),
    })?;
    Ok(doc
        .get("scripts")
        .and_then(JsonValue::as_object)
        .map(|scripts| scripts.keys().cloned().collect())
        .unwrap_or_default())
}

/// Write run configurations for every script in `known` that the project
/// declares. Files with identical content are not rewritten.
pub fn generate(
    project_dir: &Path,
    root: &Path,
    rel: &str,
    project: &str,
    known: &[RunScript],
) -> Result<MergeOutcome> {
    let Some(manifest) = read_fragment(&project_dir.join("package.json"), OPERATION)? else {
        return Ok(MergeOutcome::Absent);
    };
    let declared = declared_scripts(&manifest)?;

    let run_dir = root.join(RUN_DIR);
    let mut matched = 0;
    let mut written = Vec::new();
    for RunScript { script, label } in known {
        if !declared.iter().any(|d| d == script) {
            continue;
        }
        matched += 1;
        let file_name = config_file_name(project, label);
        let path = run_dir.join(&file_name);
        let content = render(project, rel, script, label);
        if read_fragment(&path, OPERATION)?.as_deref() == Some(content.as_str()) {
            continue;
        }
        write_target(&path, &content, OPERATION)?;
        written.push(file_name);
    }

    Ok(match (matched, written.len()) {
        (0, _) => MergeOutcome::NotApplicable("no well-known npm scripts".to_string()),
        (_, 0) => MergeOutcome::Unchanged(format!("{} configuration(s) up to date", matched)),
        (_, _) => MergeOutcome::Merged(format!("{} written to {}/", written.join(", "), RUN_DIR)),
    })
}
