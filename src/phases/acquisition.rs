//! Phase 1: Template Acquisition
//!
//! Produces the generated project inside a staging directory. Nothing in the
//! monorepo outside the staging directory is touched by this phase.
//!
//! ## Methods
//!
//! - **cookiecutter**: the templating engine renders the template straight
//!   into the staging directory.
//! - **github-template**: the repository is shallow-cloned into a scratch
//!   directory in the system temp location, stripped of `.git`, customized,
//!   and copied to `<staging>/<slug>`.
//!
//! Both directories are [`TempDir`] guards, so they are removed however this
//! phase exits.

use std::path::Path;

use log::{debug, info};
use tempfile::TempDir;

use crate::config::{AcquisitionMethod, TemplateSource, ToolCommands};
use crate::customize::{customize_tree, Customizations};
use crate::error::{Error, Result};
use crate::filesystem::copy_dir_recursive;
use crate::git::{clone_shallow, remove_vcs_dir};
use crate::report::Report;
use crate::runner::CommandRunner;
use crate::slug::ProjectIdentifier;

/// Prefix of the hidden staging directory inside the monorepo root.
pub const STAGING_PREFIX: &str = ".add-project-";

/// Directory owned by one run until the project is placed.
///
/// It lives inside the monorepo root so that final placement is a rename on
/// the same filesystem.
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    pub fn create(root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(root)
            .map_err(|e| Error::Filesystem {
                message: format!(
                    "Failed to create staging directory in '{}': {}",
                    root.display(),
                    e
                ),
            })?;
        debug!("Staging in {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Arguments for a non-interactive templating-engine run.
pub fn cookiecutter_args(
    source: &TemplateSource,
    project: &ProjectIdentifier,
    staging: &Path,
) -> Vec<String> {
    let mut args = vec![
        source.repo.clone(),
        format!("--checkout={}", source.version),
        format!("--output-dir={}", staging.display()),
        "--no-input".to_string(),
    ];
    args.extend(
        source
            .defaults
            .iter()
            .map(|(key, value)| format!("{}={}", key, value)),
    );
    for (key, value) in [("project_name", project.name()), ("project_slug", project.slug())] {
        if !source.defaults.contains_key(key) {
            args.push(format!("{}={}", key, value));
        }
    }
    args
}

/// Everything acquisition needs besides the template itself.
pub struct Acquirer<'a> {
    pub runner: &'a dyn CommandRunner,
    pub tools: &'a ToolCommands,
    /// Files a cloned template gets placeholders replaced in.
    pub customizable_files: &'a [String],
}

impl Acquirer<'_> {
    /// Execute Phase 1: generate `project` from `source` into `staging`
    pub fn execute(
        &self,
        source: &TemplateSource,
        project: &ProjectIdentifier,
        staging: &Path,
        report: &mut Report,
    ) -> Result<()> {
        info!(
            "Acquiring '{}' from {}@{} ({})",
            source.name, source.repo, source.version, source.template_type
        );
        match source.template_type {
            AcquisitionMethod::Cookiecutter => self.render(source, project, staging),
            AcquisitionMethod::GithubTemplate => self.clone_template(source, project, staging, report),
        }
    }

    fn render(&self, source: &TemplateSource, project: &ProjectIdentifier, staging: &Path) -> Result<()> {
        let engine = self.tools.cookiecutter.as_str();
        let args = cookiecutter_args(source, project, staging);
        let output = self
            .runner
            .run(engine, &args, None)
            .map_err(|e| Error::Acquisition {
                template: source.name.clone(),
                message: crate::suggestions::tool_not_found(engine, &e),
                stdout: String::new(),
                stderr: String::new(),
            })?;

        if !output.success {
            return Err(Error::Acquisition {
                template: source.name.clone(),
                message: format!("{} exited with {}", engine, output.status_description()),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    fn clone_template(
        &self,
        source: &TemplateSource,
        project: &ProjectIdentifier,
        staging: &Path,
        report: &mut Report,
    ) -> Result<()> {
        let scratch = tempfile::Builder::new()
            .prefix("add-project-clone-")
            .tempdir()
            .map_err(|e| Error::Filesystem {
                message: format!("Failed to create scratch directory: {}", e),
            })?;
        let checkout = scratch.path().join(project.slug());

        clone_shallow(
            self.runner,
            &self.tools.git,
            &source.repo,
            &source.version,
            &checkout,
        )?;
        remove_vcs_dir(&checkout)?;

        let customizations =
            Customizations::new(&source.customizations, project.name(), project.slug());
        customize_tree(&checkout, self.customizable_files, &customizations, report)?;

        copy_dir_recursive(&checkout, &staging.join(project.slug()))
    }
}
