//! Default values for add-project configuration.
//!
//! This module provides centralized default values used across the engine and
//! the CLI, ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// Directory at the monorepo root that marks it as such.
pub const MONOREPO_MARKER_DIR: &str = ".monorepo";

/// Template configuration file, relative to the monorepo root.
pub const DEFAULT_CONFIG_PATH: &str = ".monorepo/project-templates.yaml";

/// Branch or tag used when a template does not name a version.
pub const DEFAULT_TEMPLATE_VERSION: &str = "main";

/// Subdirectory projects are placed under when a template names none.
pub const DEFAULT_TARGET_DIR: &str = "packages";

/// Files rewritten by `github-template` customizations.
pub const CUSTOMIZABLE_FILES: &[&str] = &[
    "package.json",
    "README.md",
    "vite.config.ts",
    "vite.config.js",
    "tsconfig.json",
];

/// Documentation files kept untouched in the project.
pub const DOCUMENTATION_FILES: &[&str] = &[
    "README.md",
    "CONTRIBUTING.md",
    "CHANGELOG.md",
    "CODE_OF_CONDUCT.md",
];

/// License file names compared against the monorepo's.
pub const LICENSE_FILES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE.txt"];

/// Python tool configs the monorepo already provides at its root.
pub const PYTHON_DUPLICATE_CONFIGS: &[&str] = &[
    "ruff.toml",
    ".ruff.toml",
    "pyrightconfig.json",
    ".pyrightconfig.json",
];

/// Actions that need to be told which subdirectory to deploy.
pub const PREVIEW_ACTIONS: &[&str] = &["superfly/fly-pr-review-apps"];

/// `package.json` scripts that get an IDE run configuration, with labels.
pub const RUN_CONFIG_SCRIPTS: &[(&str, &str)] = &[
    ("dev", "Dev Server"),
    ("start", "Start"),
    ("build", "Build"),
    ("test", "Tests"),
    ("test:watch", "Tests (Watch)"),
    ("test:ui", "Tests (UI)"),
    ("test:coverage", "Test Coverage"),
    ("lint", "Lint"),
    ("typecheck", "Typecheck"),
    ("format", "Format"),
];

/// Project-specific test configuration worth reviewing after integration.
pub const TEST_CONFIG_FILES: &[&str] = &["pytest.ini", "tox.ini", ".coveragerc"];

/// Locate the monorepo root for `start`.
///
/// Walks up from `start` to the nearest directory containing
/// [`MONOREPO_MARKER_DIR`]. Falls back to `start` itself when no ancestor
/// qualifies.
pub fn find_monorepo_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(MONOREPO_MARKER_DIR).is_dir())
        .unwrap_or(start)
        .to_path_buf()
}
