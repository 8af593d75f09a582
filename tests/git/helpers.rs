//! Shared helpers for tests that drive a real `git` working copy.

use rstest::fixture;
use std::fs;
use std::path::Path;
use std::process::Command;
use tasktrace::task::{adapters::git::GitBranchService, domain::BranchName};
use tempfile::TempDir;

/// A throwaway repository with one commit on `main`.
pub struct TestRepository {
    /// Keeps the directory alive for the duration of the test.
    pub dir: TempDir,
    /// Branch service bound to the repository.
    pub service: GitBranchService,
}

impl TestRepository {
    /// Returns the working copy root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Runs `git` in the working copy and returns trimmed stdout.
    ///
    /// # Errors
    ///
    /// Returns an error when git cannot be spawned or exits unsuccessfully.
    pub fn git(&self, args: &[&str]) -> Result<String, eyre::Report> {
        run_git(self.path(), args)
    }

    /// Writes `content` to `relative` and commits it on the current branch.
    ///
    /// # Errors
    ///
    /// Returns an error when the write or commit fails.
    pub fn commit_file(
        &self,
        relative: &str,
        content: &str,
        message: &str,
    ) -> Result<(), eyre::Report> {
        fs::write(self.path().join(relative), content)?;
        self.git(&["add", relative])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }
}

/// Runs `git` in `dir` and returns trimmed stdout.
///
/// # Errors
///
/// Returns an error when git cannot be spawned or exits unsuccessfully.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<String, eyre::Report> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C")
        .output()?;
    eyre::ensure!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Creates a repository on `main` with a committed `README.md`.
///
/// # Errors
///
/// Returns an error when the directory or any git command fails.
pub fn init_repository() -> Result<TestRepository, eyre::Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path();
    run_git(path, &["init", "--quiet", "-b", "main"])?;
    run_git(path, &["config", "user.name", "Tasktrace Tests"])?;
    run_git(path, &["config", "user.email", "tests@tasktrace.invalid"])?;
    run_git(path, &["config", "commit.gpgsign", "false"])?;
    fs::write(path.join("README.md"), "tasktrace\n")?;
    run_git(path, &["add", "README.md"])?;
    run_git(path, &["commit", "--quiet", "-m", "Initial commit"])?;

    let service = GitBranchService::new(path, BranchName::main());
    Ok(TestRepository { dir, service })
}

/// Provides a fresh repository per test.
#[fixture]
pub fn repository() -> TestRepository {
    init_repository().unwrap_or_else(|err| panic!("test repository setup failed: {err:?}"))
}
