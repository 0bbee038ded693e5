//! Git subprocess client.

use std::borrow::Cow;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::SourceError;

/// Runs the configured git program. Each call is a single child process
/// that is killed if the tool is interrupted.
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
}

impl Default for Git {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Git {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `git clone --depth 1 --branch <branch> <url> <dest>`
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ExternalProcessFailure`] with git's stderr, or
    /// [`SourceError::Interrupted`] on Ctrl-C.
    pub async fn clone_shallow(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
    ) -> Result<(), SourceError> {
        let args: Vec<OsString> = vec![
            "clone".into(),
            "--depth".into(),
            "1".into(),
            "--branch".into(),
            branch.into(),
            "--".into(),
            url.into(),
            dest.into(),
        ];
        self.run(&args, None).await.map(drop)
    }

    /// `git pull --ff-only` inside `repo`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ExternalProcessFailure`] with git's stderr, or
    /// [`SourceError::Interrupted`] on Ctrl-C.
    pub async fn pull_ff_only(&self, repo: &Path) -> Result<(), SourceError> {
        let args: Vec<OsString> = vec!["pull".into(), "--ff-only".into()];
        self.run(&args, Some(repo)).await.map(drop)
    }

    async fn run(&self, args: &[OsString], cwd: Option<&Path>) -> Result<String, SourceError> {
        let command = std::iter::once(Cow::Borrowed(self.program.as_str()))
            .chain(args.iter().map(|a| a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        tracing::debug!(%command, "spawning");
        let child = cmd
            .spawn()
            .map_err(|e| SourceError::ExternalProcessFailure {
                command: command.clone(),
                stderr: e.to_string(),
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(%command, "interrupted, killing child process");
                return Err(SourceError::Interrupted(command));
            }
            out = child.wait_with_output() => out?,
        };

        // The terminal's SIGINT reaches git too and may win the race above.
        if killed_by_sigint(output.status) {
            tracing::warn!(%command, "child process interrupted");
            return Err(SourceError::Interrupted(command));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            let stderr = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(SourceError::ExternalProcessFailure { command, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(unix)]
fn killed_by_sigint(status: std::process::ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_sigint(_status: std::process::ExitStatus) -> bool {
    false
}

/// Whether `program` can be spawned at all.
#[cfg(test)]
pub(crate) fn available(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failing_program_reports_external_failure() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::new("false");
        let err = git.pull_ff_only(dir.path()).await.unwrap_err();
        match err {
            SourceError::ExternalProcessFailure { command, stderr } => {
                assert_eq!(command, "false pull --ff-only");
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn sigint_death_counts_as_interrupt() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        // Raw wait statuses: low byte is the terminating signal, high byte the exit code.
        assert!(killed_by_sigint(ExitStatus::from_raw(2)));
        assert!(!killed_by_sigint(ExitStatus::from_raw(9)));
        assert!(!killed_by_sigint(ExitStatus::from_raw(130 << 8)));
        assert!(!killed_by_sigint(ExitStatus::from_raw(0)));
    }

    #[tokio::test]
    async fn missing_program_reports_external_failure() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::new("quiver-no-such-program");
        let err = git
            .clone_shallow("file:///nowhere", "main", &dir.path().join("c"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::ExternalProcessFailure { .. }));
    }

    #[tokio::test]
    async fn pull_outside_repo_surfaces_git_stderr() {
        if !available("git") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let err = Git::default().pull_ff_only(dir.path()).await.unwrap_err();
        let SourceError::ExternalProcessFailure { stderr, .. } = err else {
            panic!("expected external failure");
        };
        assert!(!stderr.is_empty());
    }

    #[tokio::test]
    async fn clone_of_missing_repo_fails() {
        if !available("git") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let url = format!("file://{}", dir.path().join("missing").display());
        let err = Git::default()
            .clone_shallow(&url, "main", &dir.path().join("clone"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::ExternalProcessFailure { .. }));
    }
}
