//! Why we shell out to `git` here
//!
//! - Safer working-tree semantics: the `git` CLI refuses to clobber
//!   uncommitted tracked changes and untracked files during checkout/clone
//!   unless explicitly forced. A library binding would have to
//!   re-implement those protections to avoid data loss.
//! - Cross-platform stability: the CLI is the one thing guaranteed to be
//!   consistent across every machine a worktree lives on.
//! - No retry policy lives here: a non-zero exit is surfaced to the
//!   caller verbatim; the caller decides whether and how to retry.
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use thiserror::Error;
use utils::shell::resolve_executable_path;

#[derive(Debug, Error)]
pub enum GitCliError {
    #[error("git executable not found or not runnable")]
    NotAvailable,
    #[error("{0}")]
    GitFailure(String),
}

/// Typed façade over the `git` executable on `$PATH`. One method per
/// operation required by the worktree engine and the orchestrators; no
/// method retries internally.
#[derive(Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    /// Raw `git status --porcelain` output. Callers treat empty output as
    /// a "not a repo" signal when combined with `isGitRepository`.
    pub fn status(&self, work_dir: &Path) -> Result<String, GitCliError> {
        self.git(work_dir, ["status", "--porcelain"])
    }

    pub fn is_clean(&self, work_dir: &Path) -> Result<bool, GitCliError> {
        Ok(self.status(work_dir)?.trim().is_empty())
    }

    /// Canonical repository identifier derived from the origin remote URL
    /// (host/org/name form), falling back to a path-based key when there
    /// is no origin. The fallback is for logical identification only and
    /// must never be used to construct a clone URL.
    pub fn get_repository_name(&self, work_dir: &Path) -> Result<String, GitCliError> {
        match self.get_remote_url(work_dir, "origin") {
            Ok(url) => Ok(crate::url::canonical_repo_id(&url)),
            Err(_) => Ok(format!("local/{}", work_dir.to_string_lossy())),
        }
    }

    pub fn remote_exists(&self, work_dir: &Path, remote: &str) -> Result<bool, GitCliError> {
        let out = self.git(work_dir, ["remote"])?;
        Ok(out.lines().any(|l| l.trim() == remote))
    }

    pub fn get_remote_url(&self, work_dir: &Path, remote: &str) -> Result<String, GitCliError> {
        Ok(self
            .git(work_dir, ["remote", "get-url", remote])?
            .trim()
            .to_string())
    }

    pub fn add_remote(&self, work_dir: &Path, remote: &str, url: &str) -> Result<(), GitCliError> {
        self.git(work_dir, ["remote", "add", remote, url])?;
        Ok(())
    }

    pub fn branch_exists(&self, work_dir: &Path, branch: &str) -> Result<bool, GitCliError> {
        let refname = format!("refs/heads/{branch}");
        Ok(self
            .git_impl(work_dir, ["show-ref", "--verify", "--quiet", &refname], None)
            .is_ok())
    }

    pub fn branch_exists_on_remote(
        &self,
        work_dir: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<bool, GitCliError> {
        let refname = format!("refs/remotes/{remote}/{branch}");
        Ok(self
            .git_impl(work_dir, ["show-ref", "--verify", "--quiet", &refname], None)
            .is_ok())
    }

    pub fn get_current_branch(&self, work_dir: &Path) -> Result<String, GitCliError> {
        Ok(self
            .git(work_dir, ["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    /// HEAD reference lookup on the remote: `git ls-remote --symref <url> HEAD`.
    pub fn get_default_branch(&self, remote_url: &str) -> Result<String, GitCliError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let envs = [no_prompt_env()];
        let out = self.git_with_env(
            &cwd,
            ["ls-remote", "--symref", remote_url, "HEAD"],
            &envs,
        )?;
        for line in out.lines() {
            if let Some(rest) = line.strip_prefix("ref: ") {
                if let Some((refname, _)) = rest.split_once('\t') {
                    if let Some(name) = refname.strip_prefix("refs/heads/") {
                        return Ok(name.to_string());
                    }
                }
            }
        }
        Err(GitCliError::GitFailure(format!(
            "could not determine default branch for {remote_url}"
        )))
    }

    pub fn fetch_remote(&self, work_dir: &Path, remote: &str) -> Result<(), GitCliError> {
        let envs = [no_prompt_env()];
        self.git_with_env(work_dir, ["fetch", remote], &envs)?;
        Ok(())
    }

    pub fn set_upstream_branch(
        &self,
        worktree_path: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<(), GitCliError> {
        self.git(
            worktree_path,
            ["branch", "--set-upstream-to", &format!("{remote}/{branch}"), branch],
        )?;
        Ok(())
    }

    /// Create a new local branch `new` from `from`.
    pub fn create_branch_from(
        &self,
        work_dir: &Path,
        new: &str,
        from: &str,
    ) -> Result<(), GitCliError> {
        self.git(work_dir, ["branch", new, from])?;
        Ok(())
    }

    /// Surface Git's own "cannot create branch X: conflicting reference Y"
    /// class of failure ahead of time, via a dry-run style check.
    pub fn check_reference_conflict(&self, work_dir: &Path, branch: &str) -> Result<(), GitCliError> {
        let refname = format!("refs/heads/{branch}");
        match self.git_impl(work_dir, ["check-ref-format", "--branch", branch], None) {
            Ok(_) => {}
            Err(e) => return Err(e),
        }
        // A conflicting reference exists when some *other* ref shares a
        // path prefix/suffix with the would-be branch name (e.g. branch
        // "a" exists while creating "a/b", or vice versa).
        let existing = self.git(work_dir, ["show-ref", "--heads"]).unwrap_or_default();
        for line in existing.lines() {
            let Some((_, existing_ref)) = line.split_once(' ') else {
                continue;
            };
            let Some(existing_branch) = existing_ref.strip_prefix("refs/heads/") else {
                continue;
            };
            if existing_branch == branch {
                continue;
            }
            let conflicts = existing_branch.starts_with(&format!("{branch}/"))
                || branch.starts_with(&format!("{existing_branch}/"));
            if conflicts {
                return Err(GitCliError::GitFailure(format!(
                    "cannot create branch '{branch}': conflicting reference '{refname}' via '{existing_branch}'"
                )));
            }
        }
        Ok(())
    }

    /// Create the worktree record without checking out working-tree
    /// files, so a pre-checkout hook can run before materialization.
    pub fn create_worktree_with_no_checkout(
        &self,
        work_dir: &Path,
        worktree_path: &Path,
        branch: &str,
    ) -> Result<(), GitCliError> {
        self.git(
            work_dir,
            [
                OsStr::new("worktree"),
                OsStr::new("add"),
                OsStr::new("--no-checkout"),
                worktree_path.as_os_str(),
                OsStr::new(branch),
            ],
        )?;
        Ok(())
    }

    pub fn checkout_branch(&self, worktree_path: &Path, branch: &str) -> Result<(), GitCliError> {
        self.git(worktree_path, ["checkout", branch])?;
        Ok(())
    }

    pub fn remove_worktree(
        &self,
        work_dir: &Path,
        worktree_path: &Path,
        force: bool,
    ) -> Result<(), GitCliError> {
        let mut args: Vec<OsString> = vec!["worktree".into(), "remove".into()];
        if force {
            args.push("--force".into());
        }
        args.push(worktree_path.as_os_str().into());
        self.git(work_dir, args)?;
        Ok(())
    }

    pub fn get_worktree_path(&self, work_dir: &Path, branch: &str) -> Result<PathBuf, GitCliError> {
        for entry in self.list_worktrees(work_dir)? {
            if entry.branch.as_deref() == Some(branch) {
                return Ok(PathBuf::from(entry.path));
            }
        }
        Err(GitCliError::GitFailure(format!(
            "no worktree registered for branch '{branch}'"
        )))
    }

    pub fn worktree_exists(&self, work_dir: &Path, branch: &str) -> Result<bool, GitCliError> {
        Ok(self.get_worktree_path(work_dir, branch).is_ok())
    }

    pub fn clone(&self, repo_url: &str, target_path: &Path, recursive: bool) -> Result<(), GitCliError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut args: Vec<OsString> = vec!["clone".into()];
        if recursive {
            args.push("--recursive".into());
        }
        args.push(OsString::from(repo_url));
        args.push(target_path.as_os_str().into());
        let envs = [no_prompt_env()];
        self.git_with_env(&cwd, args, &envs)?;
        Ok(())
    }

    /// Detached-mode clone: clone a *local* source repository to a fresh
    /// path and check out `branch` there, independent of the source's own
    /// worktree registrations.
    pub fn clone_to_path(
        &self,
        source_path: &Path,
        target_path: &Path,
        branch: &str,
    ) -> Result<(), GitCliError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        self.git_impl(
            &cwd,
            [
                OsStr::new("clone"),
                OsStr::new("--branch"),
                OsStr::new(branch),
                source_path.as_os_str(),
                target_path.as_os_str(),
            ],
            None,
        )?;
        Ok(())
    }

    pub fn list_worktrees(&self, work_dir: &Path) -> Result<Vec<WorktreeEntry>, GitCliError> {
        let out = self.git(work_dir, ["worktree", "list", "--porcelain"])?;
        let mut entries = Vec::new();
        let mut current_path: Option<String> = None;
        let mut current_head: Option<String> = None;
        let mut current_branch: Option<String> = None;

        for line in out.lines() {
            let line = line.trim();
            if line.is_empty() {
                if let (Some(path), Some(_)) = (current_path.take(), current_head.take()) {
                    entries.push(WorktreeEntry {
                        path,
                        branch: current_branch.take(),
                    });
                }
            } else if let Some(path) = line.strip_prefix("worktree ") {
                current_path = Some(path.to_string());
            } else if let Some(head) = line.strip_prefix("HEAD ") {
                current_head = Some(head.to_string());
            } else if let Some(branch_ref) = line.strip_prefix("branch ") {
                current_branch = branch_ref.strip_prefix("refs/heads/").map(str::to_string);
            }
        }
        if let (Some(path), Some(_)) = (current_path, current_head) {
            entries.push(WorktreeEntry {
                path,
                branch: current_branch,
            });
        }
        Ok(entries)
    }
}

/// Parsed worktree entry from `git worktree list --porcelain`.
#[derive(Debug, Clone)]
pub struct WorktreeEntry {
    pub path: String,
    pub branch: Option<String>,
}

fn no_prompt_env() -> (OsString, OsString) {
    (OsString::from("GIT_TERMINAL_PROMPT"), OsString::from("0"))
}

// Low-level process plumbing.
impl GitCli {
    fn ensure_available(&self) -> Result<PathBuf, GitCliError> {
        resolve_executable_path("git").ok_or(GitCliError::NotAvailable)
    }

    fn git_impl<I, S>(
        &self,
        work_dir: &Path,
        args: I,
        envs: Option<&[(OsString, OsString)]>,
    ) -> Result<String, GitCliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let git = self.ensure_available()?;
        let mut cmd = Command::new(&git);
        cmd.arg("-C").arg(work_dir);
        if let Some(envs) = envs {
            for (k, v) in envs {
                cmd.env(k, v);
            }
        }
        for a in args {
            cmd.arg(a);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::trace!(work_dir = %work_dir.display(), ?cmd, "running git command");

        let out = cmd
            .output()
            .map_err(|e| GitCliError::GitFailure(e.to_string()))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(GitCliError::GitFailure(if stderr.is_empty() {
                "git command failed with no output on stderr".to_string()
            } else {
                stderr
            }));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn git<I, S>(&self, work_dir: &Path, args: I) -> Result<String, GitCliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.git_impl(work_dir, args, None)
    }

    fn git_with_env<I, S>(
        &self,
        work_dir: &Path,
        args: I,
        envs: &[(OsString, OsString)],
    ) -> Result<String, GitCliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.git_impl(work_dir, args, Some(envs))
    }
}
