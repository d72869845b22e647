//! Phase 4: Integration
//!
//! Folds the placed project's own configuration into the monorepo. The steps
//! run in a fixed order:
//!
//! 1. VCS metadata removal (the only fatal step)
//! 2. Documentation retention
//! 3. License comparison
//! 4. `.gitattributes` merge
//! 5. Pre-commit hook merge
//! 6. CI workflow migration
//! 7. Versioning fix-up (python)
//! 8. Duplicate local config removal
//! 9. Workspace registration (typescript)
//! 10. IDE run configurations (typescript)
//! 11. Dependency sync
//!
//! A failing step is recorded as a merge warning and the next step runs.

use std::path::Path;

use log::{debug, info};

use super::detection::ProjectKind;
use crate::config::{IntegrationTables, ToolCommands};
use crate::error::Result;
use crate::filesystem::{read_optional, remove_path};
use crate::git::{remove_vcs_dir, VCS_DIR};
use crate::merge::{
    attributes, precommit, run_configs, versioning, workflows, workspace, MergeOutcome,
};
use crate::path::path_to_root;
use crate::report::{Action, Report, WarningKind};
use crate::runner::{split_command, CommandRunner};

/// The placed project and everything the steps need to act on it.
pub struct Integration<'a> {
    pub root: &'a Path,
    pub project: &'a Path,
    /// Project path relative to `root`, with forward slashes.
    pub rel: &'a str,
    /// Slug used to name migrated workflows and run configurations.
    pub name: &'a str,
    pub kind: ProjectKind,
    pub tables: &'a IntegrationTables,
    pub tools: &'a ToolCommands,
    pub runner: &'a dyn CommandRunner,
    pub sync: bool,
}

impl Integration<'_> {
    fn target(&self, file: &str) -> String {
        format!("{}/{}", self.rel, file)
    }

    /// Execute Phase 4: run every applicable step
    pub fn execute(&self, report: &mut Report) -> Result<()> {
        info!("Integrating {} ({})", self.rel, self.kind);

        // Step 1
        if remove_vcs_dir(self.project)? {
            report.removed(self.target(VCS_DIR), "the monorepo is the only VCS root");
        }

        self.retain_documentation(report);
        self.compare_license(report);

        record(
            report,
            attributes::ATTRIBUTES_FILE,
            attributes::merge_into(self.project, self.root, self.rel),
        );
        record(
            report,
            precommit::PRECOMMIT_FILE,
            precommit::merge_into(self.project, self.root, self.rel),
        );
        let migrated = workflows::migrate(
            self.project,
            self.root,
            self.rel,
            self.name,
            &self.tables.preview_actions,
            report,
        );
        record(report, workflows::WORKFLOWS_DIR, migrated);

        if self.kind.has_python() {
            record(
                report,
                &self.target(versioning::PYPROJECT_FILE),
                versioning::fix_project(self.project, &path_to_root(self.rel)),
            );
        }

        self.remove_duplicate_configs(report);

        if self.kind.has_typescript() {
            record(
                report,
                workspace::PACKAGE_JSON,
                workspace::register_in(self.root, self.rel),
            );
            if self.tables.run_configurations {
                record(
                    report,
                    run_configs::RUN_DIR,
                    run_configs::generate(
                        self.project,
                        self.root,
                        self.rel,
                        self.name,
                        &self.tables.run_configuration_scripts,
                    ),
                );
            }
        } else if self.kind == ProjectKind::Python {
            report.skipped(
                workspace::PACKAGE_JSON,
                "python projects are picked up by the workspace glob",
            );
        }

        self.sync_dependencies(report);
        Ok(())
    }

    fn retain_documentation(&self, report: &mut Report) {
        for file in &self.tables.documentation_files {
            if self.project.join(file).is_file() {
                report.kept(self.target(file), "documentation");
            }
        }
        if self.project.join("docs").is_dir() {
            report.kept(self.target("docs/"), "documentation");
        }
        if self.project.join(".gitignore").is_file() {
            report.kept(self.target(".gitignore"), "project ignore rules");
        }
    }

    fn compare_license(&self, report: &mut Report) {
        let first_present = |dir: &Path| -> Result<Option<(String, String)>> {
            for name in &self.tables.license_files {
                if let Some(content) = read_optional(&dir.join(name))? {
                    return Ok(Some((name.clone(), content)));
                }
            }
            Ok(None)
        };

        let compared = first_present(self.project)
            .and_then(|project| Ok((project, first_present(self.root)?)));
        match compared {
            Ok((None, _)) => {}
            Ok((Some((name, _)), None)) => {
                report.kept(self.target(&name), "the monorepo has no license file");
            }
            Ok((Some((name, project)), Some((root_name, monorepo)))) => {
                if project.trim() == monorepo.trim() {
                    report.kept(self.target(&name), format!("matches {}", root_name));
                } else {
                    report.warn(
                        WarningKind::License,
                        self.target(&name),
                        format!("differs from the monorepo {}; review the licensing", root_name),
                    );
                }
            }
            Err(e) => report.warn(WarningKind::Merge, "LICENSE", e.to_string()),
        }
    }

    fn remove_duplicate_configs(&self, report: &mut Report) {
        let duplicates = &self.tables.duplicate_configs;
        let mut files: Vec<&String> = Vec::new();
        if self.kind.has_python() {
            files.extend(&duplicates.python);
        }
        if self.kind.has_typescript() {
            files.extend(&duplicates.typescript);
        }

        for file in files {
            match remove_path(&self.project.join(file)) {
                Ok(true) => report.removed(self.target(file), "the monorepo config applies"),
                Ok(false) => {}
                Err(e) => report.warn(WarningKind::Merge, self.target(file), e.to_string()),
            }
        }
    }

    fn sync_dependencies(&self, report: &mut Report) {
        let mut commands: Vec<&[String]> = Vec::new();
        if self.kind.has_python() {
            commands.push(&self.tools.python_sync);
        }
        if self.kind.has_typescript() {
            commands.push(&self.tools.typescript_sync);
        }

        for command in commands {
            let Some((program, args)) = split_command(command) else {
                debug!("Sync disabled for this ecosystem");
                continue;
            };
            let shown = command.join(" ");
            if !self.sync {
                report.skipped(shown, "--no-sync");
                continue;
            }

            info!("Running {} in {}", shown, self.root.display());
            let failure = match self.runner.run(program, args, Some(self.root)) {
                Ok(output) if output.success => None,
                Ok(output) => {
                    let stderr = output.stderr.trim();
                    Some(if stderr.is_empty() {
                        output.status_description()
                    } else {
                        format!("{}: {}", output.status_description(), stderr)
                    })
                }
                Err(e) => Some(format!("could not run '{}': {}", program, e)),
            };

            match failure {
                None => report.record(Action::Synced, shown, "dependencies installed"),
                Some(detail) => {
                    report.warn(WarningKind::Sync, shown.as_str(), detail);
                    let hint = crate::suggestions::sync_failed(&shown);
                    report.follow_up(shown, hint);
                }
            }
        }
    }
}

/// Turn one step's outcome into report entries. Errors become warnings.
fn record(report: &mut Report, target: &str, outcome: Result<MergeOutcome>) {
    match outcome {
        Ok(MergeOutcome::Absent) => debug!("{}: nothing to merge", target),
        Ok(MergeOutcome::Merged(detail)) | Ok(MergeOutcome::Unchanged(detail)) => {
            report.merged(target, detail)
        }
        Ok(MergeOutcome::NotApplicable(detail)) => report.skipped(target, detail),
        Err(e) => report.warn(WarningKind::Merge, target, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockRunner {
        calls: RefCell<Vec<(String, Vec<String>, Option<PathBuf>)>>,
        fail: bool,
    }

    impl CommandRunner for MockRunner {
        fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> std::io::Result<CommandOutput> {
            self.calls.borrow_mut().push((
                program.to_string(),
                args.to_vec(),
                cwd.map(Path::to_path_buf),
            ));
            if self.fail {
                Ok(CommandOutput::failed(1, "network unreachable"))
            } else {
                Ok(CommandOutput::ok())
            }
        }
    }

    struct Monorepo {
        temp: TempDir,
        project: PathBuf,
    }

    impl Monorepo {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let project = temp.path().join("packages/my-tool");
            fs::create_dir_all(project.join(".git")).unwrap();
            Self { temp, project }
        }

        fn root(&self) -> &Path {
            self.temp.path()
        }

        fn run(&self, kind: ProjectKind, runner: &MockRunner, sync: bool) -> Report {
            let tables = IntegrationTables::default();
            let tools = ToolCommands::default();
            let integration = Integration {
                root: self.root(),
                project: &self.project,
                rel: "packages/my-tool",
                name: "my-tool",
                kind,
                tables: &tables,
                tools: &tools,
                runner,
                sync,
            };
            let mut report = Report::new();
            integration.execute(&mut report).unwrap();
            report
        }
    }

    #[test]
    fn test_typescript_project() {
        let repo = Monorepo::new();
        fs::write(repo.root().join("package.json"), "{\"workspaces\": []}\n").unwrap();
        fs::write(
            repo.project.join("package.json"),
            "{\"name\": \"my-tool\", \"scripts\": {\"build\": \"tsc\"}}",
        )
        .unwrap();
        fs::write(repo.project.join(".gitattributes"), "*.ts text eol=lf\n").unwrap();
        fs::write(repo.project.join("README.md"), "# my-tool\n").unwrap();
        let runner = MockRunner::default();

        let report = repo.run(ProjectKind::TypeScript, &runner, true);

        assert!(!repo.project.join(".git").exists());
        assert!(!repo.project.join(".gitattributes").exists());
        assert!(fs::read_to_string(repo.root().join(".gitattributes"))
            .unwrap()
            .contains("packages/my-tool/*.ts text eol=lf"));
        assert!(fs::read_to_string(repo.root().join("package.json"))
            .unwrap()
            .contains("packages/my-tool"));
        assert!(repo.root().join(".run/my-tool__Build.run.xml").is_file());
        assert!(!report.has_warnings());

        let targets: Vec<(Action, &str)> = report
            .entries()
            .iter()
            .map(|e| (e.action, e.target.as_str()))
            .collect();
        assert_eq!(
            targets,
            vec![
                (Action::Removed, "packages/my-tool/.git"),
                (Action::Kept, "packages/my-tool/README.md"),
                (Action::Merged, ".gitattributes"),
                (Action::Merged, "package.json"),
                (Action::Merged, ".run"),
                (Action::Synced, "npm install"),
            ]
        );

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "npm");
        assert_eq!(calls[0].2.as_deref(), Some(repo.root()));
    }

    #[test]
    fn test_python_project() {
        let repo = Monorepo::new();
        fs::write(
            repo.project.join("pyproject.toml"),
            "[build-system]\nrequires = [\"hatchling\", \"hatch-vcs\"]\n",
        )
        .unwrap();
        fs::write(repo.project.join("ruff.toml"), "").unwrap();
        let runner = MockRunner::default();

        let report = repo.run(ProjectKind::Python, &runner, true);

        assert!(fs::read_to_string(repo.project.join("pyproject.toml"))
            .unwrap()
            .contains("root = \"../..\""));
        assert!(!repo.project.join("ruff.toml").exists());
        assert_eq!(report.with_action(Action::Skipped).count(), 1);
        assert_eq!(runner.calls.borrow()[0].0, "uv");
    }

    #[test]
    fn test_license_mismatch_warns() {
        let repo = Monorepo::new();
        fs::write(repo.root().join("LICENSE"), "MIT License\n").unwrap();
        fs::write(repo.project.join("LICENSE"), "Apache License 2.0\n").unwrap();
        let runner = MockRunner::default();

        let report = repo.run(ProjectKind::Unknown, &runner, true);

        let warnings: Vec<_> = report.warnings_of(WarningKind::License).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].target, "packages/my-tool/LICENSE");
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_matching_license_kept() {
        let repo = Monorepo::new();
        fs::write(repo.root().join("LICENSE.md"), "MIT License\n\n").unwrap();
        fs::write(repo.project.join("LICENSE"), "MIT License").unwrap();

        let report = repo.run(ProjectKind::Unknown, &MockRunner::default(), true);
        assert!(!report.has_warnings());
        assert_eq!(report.with_action(Action::Kept).count(), 1);
    }

    #[test]
    fn test_failed_step_does_not_stop_pipeline() {
        let repo = Monorepo::new();
        fs::write(repo.root().join("package.json"), "{\"workspaces\": []}\n").unwrap();
        fs::write(repo.project.join("package.json"), "{}").unwrap();
        fs::write(repo.project.join(".pre-commit-config.yaml"), "repos: [oops").unwrap();
        fs::write(repo.project.join(".gitattributes"), "*.md text\n").unwrap();

        let report = repo.run(ProjectKind::TypeScript, &MockRunner::default(), true);

        let warnings: Vec<_> = report.warnings_of(WarningKind::Merge).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].target, ".pre-commit-config.yaml");
        assert!(repo.root().join(".gitattributes").exists());
        assert!(fs::read_to_string(repo.root().join("package.json"))
            .unwrap()
            .contains("packages/my-tool"));
    }

    #[test]
    fn test_sync_failure_adds_follow_up() {
        let repo = Monorepo::new();
        let runner = MockRunner {
            fail: true,
            ..Default::default()
        };

        let report = repo.run(ProjectKind::Python, &runner, true);

        let warnings: Vec<_> = report.warnings_of(WarningKind::Sync).collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].detail.contains("network unreachable"));
        let follow_ups: Vec<_> = report.with_action(Action::FollowUp).collect();
        assert_eq!(follow_ups.len(), 1);
        assert!(follow_ups[0].detail.contains("'uv sync'"));
    }

    #[test]
    fn test_no_sync() {
        let repo = Monorepo::new();
        let runner = MockRunner::default();
        let report = repo.run(ProjectKind::Hybrid, &runner, false);
        assert!(runner.calls.borrow().is_empty());
        let skipped: Vec<&str> = report
            .with_action(Action::Skipped)
            .map(|e| e.target.as_str())
            .collect();
        assert!(skipped.contains(&"uv sync"));
        assert!(skipped.contains(&"npm install"));
    }
}
