//! Orchestrator for the complete add operation
//!
//! This module coordinates all phases to provide a clean API for adding one
//! project to a monorepo.

use std::path::PathBuf;

use log::info;

use super::acquisition::{Acquirer, Staging};
use super::detection::ProjectKind;
use super::integration::Integration;
use super::placement::PlacedProject;
use super::{phase2, phase3};
use crate::config;
use crate::defaults::TEST_CONFIG_FILES;
use crate::error::Result;
use crate::report::{Action, Report, WarningKind};
use crate::runner::CommandRunner;
use crate::slug::ProjectIdentifier;

/// What the user asked for.
#[derive(Debug, Clone)]
pub struct AddRequest {
    /// Monorepo root.
    pub root: PathBuf,
    /// Template configuration document.
    pub config_path: PathBuf,
    pub template_type: String,
    pub project_name: String,
    /// Run the package-manager sync at the end.
    pub sync: bool,
}

/// The project as it ended up in the monorepo.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub project: ProjectIdentifier,
    pub placed: PlacedProject,
    pub kind: ProjectKind,
}

/// Execute the complete add operation
///
/// 1. Load the configuration and resolve the template (nothing is touched
///    when this fails)
/// 2. Acquire the project into a staging directory
/// 3. Place it under the template's target directory
/// 4. Detect the project kind
/// 5. Integrate its configuration into the monorepo
///
/// Entries are appended to `report` as the run progresses, so a caller can
/// still show what happened when an error is returned.
pub fn execute_add(
    request: &AddRequest,
    runner: &dyn CommandRunner,
    report: &mut Report,
) -> Result<AddOutcome> {
    let templates = config::from_file(&request.config_path)?;
    let source = templates.lookup(&request.template_type)?;
    let project = ProjectIdentifier::new(request.project_name.as_str());
    info!("Adding {} from template '{}'", project, source.name);

    let placed = {
        let staging = Staging::create(&request.root)?;
        let acquirer = Acquirer {
            runner,
            tools: &templates.tools,
            customizable_files: &templates.integration.customizable_files,
        };
        acquirer.execute(source, &project, staging.path(), report)?;
        phase2::execute(staging.path(), &request.root, source, project.slug(), report)?
    };

    let kind = phase3::execute(&placed.path);
    report.record(Action::Detected, placed.rel.as_str(), kind.to_string());
    if kind == ProjectKind::Unknown {
        report.warn(
            WarningKind::Merge,
            placed.rel.as_str(),
            "no pyproject.toml or package.json, ecosystem steps skipped",
        );
    }

    Integration {
        root: &request.root,
        project: &placed.path,
        rel: &placed.rel,
        name: project.slug(),
        kind,
        tables: &templates.integration,
        tools: &templates.tools,
        runner,
        sync: request.sync,
    }
    .execute(report)?;

    next_steps(report, &placed, &project);

    Ok(AddOutcome {
        project,
        placed,
        kind,
    })
}

fn next_steps(report: &mut Report, placed: &PlacedProject, project: &ProjectIdentifier) {
    report.follow_up(placed.rel.as_str(), format!("cd {}", placed.rel));
    report.follow_up(
        placed.rel.as_str(),
        "review the generated code and the merged monorepo configuration",
    );
    for file in TEST_CONFIG_FILES {
        if placed.path.join(file).is_file() {
            let target = format!("{}/{}", placed.rel, file);
            let detail = format!(
                "review {} (project-specific test configuration) against the monorepo setup",
                target
            );
            report.follow_up(target, detail);
        }
    }
    report.follow_up(
        ".",
        format!("git add -A && git commit -m \"Add {}\"", project.name()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runner::CommandOutput;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Stand-in for the templating engine: writes a small project into the
    /// `--output-dir` it is given.
    struct FakeEngine;

    impl CommandRunner for FakeEngine {
        fn run(&self, program: &str, args: &[String], _cwd: Option<&Path>) -> std::io::Result<CommandOutput> {
            if program != "cookiecutter" {
                return Ok(CommandOutput::ok());
            }
            let out = args
                .iter()
                .find_map(|a| a.strip_prefix("--output-dir="))
                .map(PathBuf::from)
                .unwrap();
            let project = out.join("my-tool");
            fs::create_dir_all(project.join(".git"))?;
            fs::write(project.join("package.json"), "{\"name\": \"my-tool\"}\n")?;
            fs::write(project.join("tox.ini"), "[tox]\n")?;
            Ok(CommandOutput::ok())
        }
    }

    fn monorepo() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".monorepo")).unwrap();
        fs::write(
            temp.path().join(".monorepo/project-templates.yaml"),
            "templates:\n  cli:\n    repo: gh:org/cli\n",
        )
        .unwrap();
        fs::write(temp.path().join("package.json"), "{\"workspaces\": []}\n").unwrap();
        temp
    }

    fn request(root: &Path, template: &str) -> AddRequest {
        AddRequest {
            root: root.to_path_buf(),
            config_path: root.join(".monorepo/project-templates.yaml"),
            template_type: template.to_string(),
            project_name: "My Tool".to_string(),
            sync: false,
        }
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_execute_add() {
        let root = monorepo();
        let mut report = Report::new();

        let outcome = execute_add(&request(root.path(), "cli"), &FakeEngine, &mut report).unwrap();

        assert_eq!(outcome.placed.rel, "packages/my-tool");
        assert_eq!(outcome.kind, ProjectKind::TypeScript);
        assert!(!outcome.placed.path.join(".git").exists());
        // Staging is gone
        assert_eq!(names(root.path()), vec![".monorepo", "package.json", "packages"]);

        let follow_ups: Vec<&str> = report
            .with_action(Action::FollowUp)
            .map(|e| e.detail.as_str())
            .collect();
        assert_eq!(follow_ups[0], "cd packages/my-tool");
        assert!(follow_ups.iter().any(|d| d.contains("test configuration")));
        assert_eq!(
            follow_ups.last().copied(),
            Some("git add -A && git commit -m \"Add My Tool\"")
        );
    }

    #[test]
    fn test_unknown_template_touches_nothing() {
        let root = monorepo();
        let before = names(root.path());
        let mut report = Report::new();

        let err = execute_add(&request(root.path(), "cl1"), &FakeEngine, &mut report).unwrap_err();

        match err {
            Error::UnknownTemplate { suggestion, available, .. } => {
                assert_eq!(suggestion.as_deref(), Some("cli"));
                assert_eq!(available, vec!["cli"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(names(root.path()), before);
        assert!(report.is_empty());
    }

    #[test]
    fn test_engine_failure_leaves_monorepo_unchanged() {
        struct FailingEngine;
        impl CommandRunner for FailingEngine {
            fn run(&self, _: &str, _: &[String], _: Option<&Path>) -> std::io::Result<CommandOutput> {
                Ok(CommandOutput::failed(1, "template error"))
            }
        }

        let root = monorepo();
        let before = names(root.path());
        let err = execute_add(&request(root.path(), "cli"), &FailingEngine, &mut Report::new())
            .unwrap_err();
        assert!(matches!(err, Error::Acquisition { .. }));
        assert_eq!(names(root.path()), before);
        assert_eq!(
            fs::read_to_string(root.path().join("package.json")).unwrap(),
            "{\"workspaces\": []}\n"
        );
    }
}
