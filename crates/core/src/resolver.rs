//! Branch Resolver (spec §4.4): given `(repoPath, branch)`, guarantee a
//! local branch of that name exists and is ready for checkout into a new
//! worktree. The decision order is deterministic and is itself part of
//! the spec, not an implementation detail — do not reorder these steps.

use std::path::Path;

use git::GitCapability;

use crate::error::{CoreError, Result};

pub struct BranchResolver<'a> {
    git: &'a dyn GitCapability,
}

impl<'a> BranchResolver<'a> {
    pub fn new(git: &'a dyn GitCapability) -> Self {
        Self { git }
    }

    /// Ensure `branch` exists locally in `repo_path`, ready for checkout.
    pub fn resolve(&self, repo_path: &Path, branch: &str) -> Result<()> {
        // 1. Conflicting reference check is fatal.
        self.git
            .check_reference_conflict(repo_path, branch)
            .map_err(CoreError::from)?;

        // 2. Already a local branch: nothing to do.
        if self.git.branch_exists(repo_path, branch)? {
            tracing::info!(branch, "branch already exists locally");
            return Ok(());
        }

        // 3. Fetch origin; tolerated on failure (fall through).
        if let Err(e) = self.git.fetch_remote(repo_path, "origin") {
            tracing::info!(branch, error = %e, "fetch from origin failed, continuing");
        }

        // 4. Remote has the branch: branch from origin/<branch>.
        match self.git.branch_exists_on_remote(repo_path, "origin", branch) {
            Ok(true) => {
                tracing::info!(branch, "branch found on origin, creating from origin/{branch}");
                self.git
                    .create_branch_from(repo_path, branch, &format!("origin/{branch}"))?;
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::info!(branch, error = %e, "could not check remote branch existence, continuing");
            }
        }

        // 5. Resolve the remote's default branch and branch from it.
        let default_branch_result = self
            .git
            .get_remote_url(repo_path, "origin")
            .map_err(CoreError::from)
            .and_then(|url| self.git.get_default_branch(&url).map_err(CoreError::from));

        match default_branch_result {
            Ok(default_branch) => {
                tracing::info!(
                    branch,
                    default_branch,
                    "creating from origin's default branch"
                );
                self.git.create_branch_from(
                    repo_path,
                    branch,
                    &format!("origin/{default_branch}"),
                )?;
                return Ok(());
            }
            Err(e) => {
                tracing::info!(branch, error = %e, "could not resolve remote default branch, falling back to local");
            }
        }

        // 6. Fatal fallback: the local current branch.
        let current = self.git.get_current_branch(repo_path)?;
        tracing::info!(branch, from = current, "creating from local current branch");
        self.git.create_branch_from(repo_path, branch, &current)?;
        Ok(())
    }
}
