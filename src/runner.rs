//! # External Tool Invocation
//!
//! Every external collaborator (the templating engine, git and the package
//! managers) is launched through the [`CommandRunner`] trait. The pipeline only
//! ever looks at the exit status and the captured output, so a runner is free
//! to be a real process spawner or a scripted stand-in.
//!
//! - **`SystemCommandRunner`**: spawns the program with `std::process::Command`,
//!   waits for it to finish and captures stdout/stderr.
//! - Tests provide their own implementations to simulate tool failures without
//!   touching the network.

use log::debug;
use std::path::Path;
use std::process::Command;

/// Result of running an external program to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the program exited with status zero.
    pub success: bool,
    /// Exit code, if the program was not killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with no output.
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Short description of the exit status for messages.
    pub fn status_description(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Trait for launching external programs - allows mocking in tests
pub trait CommandRunner {
    /// Run `program` with `args`, optionally inside `cwd`, and wait for it.
    ///
    /// An `Err` means the program could not be started at all (for example
    /// it is not installed). A program that starts and fails is reported
    /// through [`CommandOutput::success`].
    fn run(&self, program: &str, args: &[String], cwd: Option<&Path>)
        -> std::io::Result<CommandOutput>;
}

/// Runs programs as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> std::io::Result<CommandOutput> {
        debug!("Running {} {}", program, args.join(" "));

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Split a configured command line into program and leading arguments.
///
/// Returns `None` for an empty command.
pub fn split_command(command: &[String]) -> Option<(&str, &[String])> {
    command
        .split_first()
        .map(|(program, rest)| (program.as_str(), rest))
}
