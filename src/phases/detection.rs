//! Phase 3: Project Type Detection

use std::fmt;
use std::path::Path;

/// Ecosystems a placed project belongs to, from its marker files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Python,
    TypeScript,
    /// Both `pyproject.toml` and `package.json`.
    Hybrid,
    Unknown,
}

impl ProjectKind {
    pub fn has_python(self) -> bool {
        matches!(self, ProjectKind::Python | ProjectKind::Hybrid)
    }

    pub fn has_typescript(self) -> bool {
        matches!(self, ProjectKind::TypeScript | ProjectKind::Hybrid)
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectKind::Python => "python",
            ProjectKind::TypeScript => "typescript",
            ProjectKind::Hybrid => "hybrid",
            ProjectKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Execute Phase 3: classify the project at `project`
pub fn execute(project: &Path) -> ProjectKind {
    let python = project.join("pyproject.toml").is_file();
    let typescript = project.join("package.json").is_file();
    match (python, typescript) {
        (true, true) => ProjectKind::Hybrid,
        (true, false) => ProjectKind::Python,
        (false, true) => ProjectKind::TypeScript,
        (false, false) => ProjectKind::Unknown,
    }
}
