//! Shared test utilities for integration and E2E tests.
//!
//! The fixture lays out a throwaway monorepo next to a `bin/` directory of
//! shell scripts standing in for the external tools (the templating engine
//! and the package managers). The template configuration points `tools:` at
//! those scripts, so no test needs network access or real installs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_default_config();
//!     fixture.command().args(["cli", "My Tool"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::scripts;
    pub use super::TestFixture;
}

/// Shell scripts installed into the fixture's `bin/` directory.
#[allow(dead_code)]
pub mod scripts {
    /// Templating engine stand-in.
    ///
    /// Renders a small typescript project into `<output-dir>/<project_slug>`.
    /// Templates whose repository contains `broken` fail like a missing
    /// template would.
    pub const COOKIECUTTER: &str = r#"#!/bin/sh
case "$1" in
  *broken*) echo "rendering $1" ; echo "template not found: $1" >&2 ; exit 1 ;;
esac
out=""
slug=""
for arg in "$@"; do
  case "$arg" in
    --output-dir=*) out="${arg#--output-dir=}" ;;
    project_slug=*) slug="${arg#project_slug=}" ;;
  esac
done
dir="$out/$slug"
mkdir -p "$dir/.git" "$dir/.github/workflows" "$dir/src"
printf '{\n  "name": "%s",\n  "scripts": {\n    "build": "tsc",\n    "test": "vitest"\n  }\n}\n' "$slug" > "$dir/package.json"
printf '*.ts text eol=lf\n' > "$dir/.gitattributes"
printf 'name: CI\non:\n  push:\n    branches: [main]\njobs:\n  test:\n    runs-on: ubuntu-latest\n    steps:\n      - run: npm test\n' > "$dir/.github/workflows/ci.yml"
printf '# %s\n' "$slug" > "$dir/README.md"
printf 'export {};\n' > "$dir/src/index.ts"
"#;

    /// Package manager stand-in that records its invocation.
    pub const RECORDING_TOOL: &str = r#"#!/bin/sh
echo "$(basename "$0") $*" >> "$(dirname "$0")/calls.log"
"#;
}

/// A monorepo in a temporary directory with fake external tools.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create the monorepo skeleton: `.monorepo/`, a root `package.json`
    /// with an empty workspace list and a root `.gitattributes`.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("repo/.monorepo/.keep")
            .touch()
            .expect("Failed to create marker directory");
        temp_dir
            .child("repo/package.json")
            .write_str("{\n  \"name\": \"mono\",\n  \"private\": true,\n  \"workspaces\": []\n}\n")
            .expect("Failed to write root manifest");
        temp_dir
            .child("repo/.gitattributes")
            .write_str("* text=auto\n")
            .expect("Failed to write root attributes");

        let fixture = Self { temp_dir };
        fixture.install_script("cookiecutter", scripts::COOKIECUTTER);
        fixture.install_script("npm", scripts::RECORDING_TOOL);
        fixture.install_script("uv", scripts::RECORDING_TOOL);
        fixture
    }

    #[cfg(unix)]
    fn install_script(&self, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let script = self.temp_dir.child(format!("bin/{}", name));
        script.write_str(body).expect("Failed to write script");
        std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
    }

    #[cfg(not(unix))]
    fn install_script(&self, _name: &str, _body: &str) {}

    /// The `tools:` section pointing at the fixture's scripts.
    pub fn tools_yaml(&self) -> String {
        let bin = self.bin_dir();
        format!(
            "tools:\n  cookiecutter: '{0}/cookiecutter'\n  python_sync: ['{0}/uv', sync]\n  typescript_sync: ['{0}/npm', install]\n",
            bin.display()
        )
    }

    /// Write `.monorepo/project-templates.yaml` with `templates` plus the
    /// fixture's tools section.
    pub fn with_templates(self, templates: &str) -> Self {
        let content = format!("{}{}", templates, self.tools_yaml());
        self.temp_dir
            .child("repo/.monorepo/project-templates.yaml")
            .write_str(&content)
            .expect("Failed to write config file");
        self
    }

    /// A `cli` template that renders fine and a `broken` one that fails.
    pub fn with_default_config(self) -> Self {
        self.with_templates(
            "templates:\n  cli:\n    repo: https://example.com/cli-template\n    version: v1.0.0\n  broken:\n    repo: https://example.com/broken-template\n",
        )
    }

    /// Add a file under the monorepo root.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(format!("repo/{}", path))
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// The monorepo root.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("repo")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.temp_dir.path().join("bin")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join(".monorepo/project-templates.yaml")
    }

    /// Create a child path under the monorepo root.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(format!("repo/{}", path))
    }

    /// Read a file under the monorepo root.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Invocations recorded by the package manager scripts.
    pub fn tool_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.bin_dir().join("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Sorted entry names of a directory under the monorepo root.
    pub fn entries(&self, path: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path().join(path))
            .expect("Failed to read directory")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Create a CLI command running inside the monorepo root, with the
    /// environment cleared of settings that would redirect it.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("add-project");
        cmd.current_dir(self.path())
            .env_remove("ADD_PROJECT_ROOT")
            .env_remove("ADD_PROJECT_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `path` exists under `root`.
#[allow(dead_code)]
pub fn exists(root: &Path, path: &str) -> bool {
    root.join(path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_layout() {
        let fixture = TestFixture::new().with_default_config();
        assert!(fixture.path().join(".monorepo").is_dir());
        assert!(fixture.config_path().is_file());
        assert!(fixture.bin_dir().join("cookiecutter").is_file());
    }

    #[test]
    fn test_config_is_valid_yaml() {
        let fixture = TestFixture::new().with_default_config();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&fixture.read(".monorepo/project-templates.yaml"))
            .expect("Config should be valid YAML");
        assert!(parsed["templates"]["cli"].is_mapping());
    }
}
