//! # Template Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the monorepo's
//! `.monorepo/project-templates.yaml` document, as well as the logic for
//! parsing and validating it.
//!
//! ## Key Components
//!
//! - **`ProjectTemplates`**: The whole document. Holds the named templates,
//!   the integration tables the engine consults and the external tool
//!   commands.
//!
//! - **`TemplateSource`**: One entry under `templates:`. Describes where a
//!   template lives, how to acquire it and where the resulting project goes.
//!
//! - **`IntegrationTables`**: File lists and switches that drive the merge
//!   engine. Every field has a default, so the `integration:` section is
//!   optional and may override only some tables.
//!
//! - **`ToolCommands`**: The programs used for acquisition and dependency
//!   sync. Overridable so that the engine can run against wrappers or
//!   stand-ins.
//!
//! ## Parsing
//!
//! The document is first read as a generic YAML value so that an empty file
//! produces the same "No templates defined" error as an empty `templates:`
//! mapping. Scalar values in `defaults`, `customizations` and `version` may
//! be written as numbers or booleans; they are rendered to strings because
//! they only ever end up on a command line or inside a text substitution.

use crate::defaults;
use crate::error::{Error, Result};
use crate::suggestions;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

/// Placeholder in `integrate_path` replaced by the project slug.
pub const SLUG_PLACEHOLDER: &str = "{project_slug}";

/// How a template is turned into a project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcquisitionMethod {
    /// Render a cookiecutter template non-interactively.
    #[default]
    Cookiecutter,
    /// Clone a repository verbatim and customize a few files.
    GithubTemplate,
}

impl fmt::Display for AcquisitionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionMethod::Cookiecutter => f.write_str("cookiecutter"),
            AcquisitionMethod::GithubTemplate => f.write_str("github-template"),
        }
    }
}

/// One template definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateSource {
    /// Template type name (the key under `templates:`).
    #[serde(skip)]
    pub name: String,
    /// Repository URL or path handed to the acquisition tool.
    pub repo: String,
    /// Branch, tag or commit to check out.
    #[serde(default = "default_version", deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default)]
    pub template_type: AcquisitionMethod,
    /// Extra context passed to the templating engine.
    #[serde(default, deserialize_with = "scalar_map")]
    pub defaults: BTreeMap<String, String>,
    /// Where the real project sits inside the generated tree.
    #[serde(default)]
    pub integrate_path: Option<String>,
    /// Monorepo subdirectory the project is placed under.
    #[serde(default = "default_target_dir")]
    pub target_dir: String,
    /// Placeholder values for `github-template` customization.
    #[serde(default, deserialize_with = "scalar_map")]
    pub customizations: BTreeMap<String, String>,
}

impl TemplateSource {
    /// The integration path with the slug substituted, if one is configured.
    pub fn integration_path(&self, slug: &str) -> Option<String> {
        self.integrate_path
            .as_ref()
            .map(|pattern| pattern.replace(SLUG_PLACEHOLDER, slug))
    }

    fn validate(&self) -> Result<()> {
        if self.repo.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: format!("Template '{}' has an empty 'repo' field", self.name),
                hint: Some("Set 'repo:' to the template's repository URL".to_string()),
            });
        }
        if !is_relative_within(&self.target_dir) {
            return Err(Error::ConfigParse {
                message: format!(
                    "Template '{}' has invalid target_dir '{}'",
                    self.name, self.target_dir
                ),
                hint: Some(
                    "target_dir must be a relative path inside the monorepo, like 'packages'"
                        .to_string(),
                ),
            });
        }
        if let Some(pattern) = &self.integrate_path {
            if !is_relative_within(pattern) {
                return Err(Error::ConfigParse {
                    message: format!(
                        "Template '{}' has invalid integrate_path '{}'",
                        self.name, pattern
                    ),
                    hint: Some(
                        "integrate_path is relative to the generated output, like '{project_slug}'"
                            .to_string(),
                    ),
                });
            }
        }
        Ok(())
    }
}

fn default_version() -> String {
    defaults::DEFAULT_TEMPLATE_VERSION.to_string()
}

fn default_target_dir() -> String {
    defaults::DEFAULT_TARGET_DIR.to_string()
}

/// Duplicate local config files removed per ecosystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DuplicateConfigs {
    pub python: Vec<String>,
    pub typescript: Vec<String>,
}

impl Default for DuplicateConfigs {
    fn default() -> Self {
        Self {
            python: to_strings(defaults::PYTHON_DUPLICATE_CONFIGS),
            typescript: Vec::new(),
        }
    }
}

/// An npm script that gets an IDE run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunScript {
    /// Key under `scripts` in `package.json`.
    pub script: String,
    /// Shown in the IDE and used in the file name.
    pub label: String,
}

/// Tables that drive the integration engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntegrationTables {
    pub customizable_files: Vec<String>,
    pub documentation_files: Vec<String>,
    pub license_files: Vec<String>,
    pub duplicate_configs: DuplicateConfigs,
    pub preview_actions: Vec<String>,
    /// Write IDE run configurations for `package.json` scripts.
    pub run_configurations: bool,
    pub run_configuration_scripts: Vec<RunScript>,
}

impl Default for IntegrationTables {
    fn default() -> Self {
        Self {
            customizable_files: to_strings(defaults::CUSTOMIZABLE_FILES),
            documentation_files: to_strings(defaults::DOCUMENTATION_FILES),
            license_files: to_strings(defaults::LICENSE_FILES),
            duplicate_configs: DuplicateConfigs::default(),
            preview_actions: to_strings(defaults::PREVIEW_ACTIONS),
            run_configurations: true,
            run_configuration_scripts: defaults::RUN_CONFIG_SCRIPTS
                .iter()
                .map(|(script, label)| RunScript {
                    script: script.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }
}

/// External programs used by the pipeline.
///
/// An empty sync command disables sync for that ecosystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolCommands {
    pub cookiecutter: String,
    pub git: String,
    pub python_sync: Vec<String>,
    pub typescript_sync: Vec<String>,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            cookiecutter: "cookiecutter".to_string(),
            git: "git".to_string(),
            python_sync: vec!["uv".to_string(), "sync".to_string()],
            typescript_sync: vec!["npm".to_string(), "install".to_string()],
        }
    }
}

/// The parsed template configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectTemplates {
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateSource>,
    #[serde(default)]
    pub integration: IntegrationTables,
    #[serde(default)]
    pub tools: ToolCommands,
}

impl ProjectTemplates {
    /// Template names in sorted order.
    pub fn template_names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Look up a template by type name.
    ///
    /// Unknown names produce [`Error::UnknownTemplate`] listing the available
    /// templates and, when one is close enough, a did-you-mean suggestion.
    pub fn lookup(&self, name: &str) -> Result<&TemplateSource> {
        if let Some(source) = self.templates.get(name) {
            return Ok(source);
        }
        let names = self.template_names();
        Err(Error::UnknownTemplate {
            name: name.to_string(),
            suggestion: suggestions::find_similar(name, &names).map(str::to_string),
            available: names.iter().map(|n| n.to_string()).collect(),
        })
    }
}

/// Parse a template configuration document.
pub fn parse(yaml_content: &str) -> Result<ProjectTemplates> {
    let value: YamlValue = serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: format!("Invalid YAML: {}", e),
        hint: None,
    })?;

    if value.is_null() {
        return Err(no_templates());
    }

    let mut config: ProjectTemplates =
        serde_yaml::from_value(value).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: Some(
                "Each template needs at least 'repo:'; see 'templates:' in the documentation"
                    .to_string(),
            ),
        })?;

    if config.templates.is_empty() {
        return Err(no_templates());
    }

    for (name, source) in config.templates.iter_mut() {
        source.name = name.clone();
        source.validate()?;
    }

    Ok(config)
}

/// Load and parse the configuration file at `path`.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ProjectTemplates> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::ConfigParse {
            message: format!("Configuration file not found: {}", path.display()),
            hint: Some(format!(
                "Create {} with a 'templates:' mapping, or pass -c/--config",
                defaults::DEFAULT_CONFIG_PATH
            )),
        });
    }
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

fn no_templates() -> Error {
    Error::ConfigParse {
        message: "No templates defined in configuration".to_string(),
        hint: Some("Add at least one entry under 'templates:'".to_string()),
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Whether `path` is relative and never climbs out of its base.
fn is_relative_within(path: &str) -> bool {
    !path.trim().is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Render a YAML scalar the way it would be typed on a command line.
fn render_scalar(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Null => Some(String::new()),
        _ => None,
    }
}

fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = YamlValue::deserialize(deserializer)?;
    render_scalar(&value)
        .ok_or_else(|| serde::de::Error::custom("expected a scalar value, found a collection"))
}

fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, YamlValue>> = Option::deserialize(deserializer)?;
    let mut rendered = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = render_scalar(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "value for '{}' must be a scalar, found a collection",
                key
            ))
        })?;
        rendered.insert(key, text);
    }
    Ok(rendered)
}
