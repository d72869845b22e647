use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::runner::CommandRunner;
use log::debug;

/// Name of the version-control metadata directory.
pub const VCS_DIR: &str = ".git";

/// Clone a repository at a specific ref using shallow clone
///
/// This uses the configured git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
pub fn clone_shallow(
    runner: &dyn CommandRunner,
    git: &str,
    url: &str,
    ref_name: &str,
    target_dir: &Path,
) -> Result<()> {
    // git won't clone into an existing non-empty directory
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let args = vec![
        "clone".to_string(),
        "--depth=1".to_string(),
        "--branch".to_string(),
        ref_name.to_string(),
        url.to_string(),
        target_dir.to_string_lossy().into_owned(),
    ];

    let output = runner.run(git, &args, None).map_err(|e| Error::GitClone {
        url: url.to_string(),
        reference: ref_name.to_string(),
        message: crate::suggestions::tool_not_found(git, &e),
    })?;

    if !output.success {
        let stderr = output.stderr.trim();

        // Provide helpful error message for common auth failures
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                For private repos, ensure you have:\n\
                - SSH key added to ssh-agent\n\
                - Git credentials configured\n\
                - Personal access token set up\n\
                Error: {}",
                stderr
            )
        } else if stderr.is_empty() {
            output.status_description()
        } else {
            stderr.to_string()
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            reference: ref_name.to_string(),
            message,
        });
    }

    debug!("Cloned {}@{} into {}", url, ref_name, target_dir.display());
    Ok(())
}

/// Delete the `.git` directory (or gitlink file) of `project`.
///
/// Returns whether anything was removed. Failure maps to
/// [`Error::VcsRemoval`].
pub fn remove_vcs_dir(project: &Path) -> Result<bool> {
    let vcs = project.join(VCS_DIR);
    crate::filesystem::remove_path(&vcs).map_err(|e| Error::VcsRemoval {
        path: vcs.display().to_string(),
        message: e.to_string(),
    })
}
