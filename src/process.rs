//! Centralized command execution for the external tools.
//!
//! Every tool qvm drives (downloader, `qemu-img`, `qemu-system-x86_64`)
//! goes through [`Cmd`]: an explicit argv, never a shell string. The child
//! inherits the terminal so installers and QEMU can own it.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Builder for configuring command execution.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            allow_fail: false,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Render the command line the way a user would type it.
    ///
    /// Only used for echoing; execution never goes through a shell.
    pub fn display(&self) -> String {
        self.argv().join(" ")
    }

    /// Run the command with inherited stdio (interactive/streaming).
    ///
    /// Output goes directly to the terminal. Fails only if the program
    /// cannot be spawned, or if it exits non-zero without `allow_fail`.
    pub fn run_interactive(self) -> Result<ExitStatus> {
        tracing::debug!(command = %self.display(), "spawning");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().with_context(|| missing_tool_hint(&self.program))?;
        tracing::debug!(program = %self.program, code = ?status.code(), "exited");

        if !self.allow_fail && !status.success() {
            bail!(
                "'{}' failed (exit code {})",
                self.program,
                status.code().unwrap_or(-1)
            );
        }

        Ok(status)
    }
}

fn missing_tool_hint(program: &str) -> String {
    if exists(program) {
        format!("Failed to execute '{}'", program)
    } else {
        format!("Failed to execute '{}'. Is it installed?", program)
    }
}

/// Check if a program exists in PATH.
///
/// Returns the full path if found, None otherwise.
pub fn which(program: &str) -> Option<String> {
    which::which(program)
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

/// Check if a program exists in PATH (bool version).
pub fn exists(program: &str) -> bool {
    which(program).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_interactive_success() {
        let status = Cmd::new("true").run_interactive().unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_run_interactive_failure_is_error() {
        let err = Cmd::new("false").run_interactive().unwrap_err();
        assert!(err.to_string().contains("'false' failed"));
    }

    #[test]
    fn test_allow_fail() {
        let status = Cmd::new("false").allow_fail().run_interactive().unwrap();
        assert!(!status.success());
        assert_eq!(status.code(), Some(1));
    }

    #[test]
    fn test_missing_program_hint() {
        let err = Cmd::new("nonexistent_program_12345")
            .run_interactive()
            .unwrap_err();
        assert!(err.to_string().contains("Is it installed?"));
    }

    #[test]
    fn test_display_joins_argv() {
        let cmd = Cmd::new("qemu-img")
            .args(["create", "-f", "qcow2"])
            .arg_path(Path::new("vm.size10G.qcow2"))
            .arg("10G");
        assert_eq!(cmd.display(), "qemu-img create -f qcow2 vm.size10G.qcow2 10G");
    }

    #[test]
    fn test_which_exists() {
        // `sh` should exist on any Unix system
        assert!(which("sh").is_some());
        assert!(exists("sh"));
    }

    #[test]
    fn test_which_not_exists() {
        assert!(which("nonexistent_program_12345").is_none());
        assert!(!exists("nonexistent_program_12345"));
    }
}
