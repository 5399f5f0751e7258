//! Worktree Engine (spec §4.5): one pair of transactional operations.
//! Every step is a rollback point — on failure, the engine removes
//! anything it already created for this worktree and surfaces the
//! primary error, logging (never discarding) secondary compensation
//! errors.

use std::path::{Path, PathBuf};

use git::GitCapability;
use store::{StatusStore, WorktreeInfo};

use crate::{
    error::{CoreError, Result},
    filesystem::Filesystem,
    hooks::HookRegistry,
    prompt::Prompt,
    resolver::BranchResolver,
};

pub struct CreateParams {
    pub repo_id: String,
    pub branch: String,
    pub worktree_path: PathBuf,
    pub repo_path: PathBuf,
    pub remote: String,
    pub issue: Option<store::IssueInfo>,
    pub force: bool,
    pub detached: bool,
}

pub struct DeleteParams {
    pub repo_id: String,
    pub branch: String,
    pub worktree_path: PathBuf,
    pub repo_path: PathBuf,
    pub force: bool,
}

pub struct WorktreeEngine<'a> {
    git: &'a dyn GitCapability,
    fs: &'a dyn Filesystem,
    store: &'a StatusStore,
    prompt: &'a dyn Prompt,
    hooks: &'a HookRegistry,
}

impl<'a> WorktreeEngine<'a> {
    pub fn new(
        git: &'a dyn GitCapability,
        fs: &'a dyn Filesystem,
        store: &'a StatusStore,
        prompt: &'a dyn Prompt,
        hooks: &'a HookRegistry,
    ) -> Self {
        Self {
            git,
            fs,
            store,
            prompt,
            hooks,
        }
    }

    pub fn create(&self, params: CreateParams) -> Result<()> {
        // 1. Validate.
        if !git::is_valid_branch_name(&params.branch) {
            return Err(CoreError::InvalidBranchName(params.branch));
        }
        if self.store.get_worktree(&params.repo_id, &params.branch).is_ok() {
            return Err(CoreError::WorktreeExists {
                repo_id: params.repo_id,
                branch: params.branch,
            });
        }
        if self.fs.exists(&params.worktree_path) {
            return Err(CoreError::DirectoryExists(params.worktree_path));
        }
        if let Some(parent) = params.worktree_path.parent() {
            self.fs.mkdir_all(parent)?;
        }

        // 2. Prepare directory.
        self.fs.mkdir_all(&params.worktree_path)?;

        // 3/4. Materialize the worktree.
        let materialize_result = if params.detached {
            self.materialize_detached(&params)
        } else {
            self.materialize_attached(&params)
        };
        if let Err(e) = materialize_result {
            self.rollback_directory(&params.worktree_path);
            return Err(e);
        }

        // 5. Register, with the auto-add-repository retry.
        if let Err(e) = self.register(&params) {
            self.rollback_directory(&params.worktree_path);
            return Err(e);
        }

        Ok(())
    }

    fn materialize_detached(&self, params: &CreateParams) -> Result<()> {
        if self.git.branch_exists(&params.repo_path, &params.branch)? {
            self.git
                .clone_to_path(&params.repo_path, &params.worktree_path, &params.branch)?;
            return Ok(());
        }
        let origin_url = self
            .git
            .get_remote_url(&params.repo_path, "origin")
            .map_err(|_| CoreError::OriginRemoteNotFound(params.repo_path.clone()))?;
        self.git.clone(&origin_url, &params.worktree_path, true)?;
        self.git.checkout_branch(&params.worktree_path, &params.branch)?;
        Ok(())
    }

    fn materialize_attached(&self, params: &CreateParams) -> Result<()> {
        BranchResolver::new(self.git).resolve(&params.repo_path, &params.branch)?;
        self.git
            .create_worktree_with_no_checkout(&params.repo_path, &params.worktree_path, &params.branch)?;
        self.hooks.run("pre-checkout", &params.worktree_path)?;
        self.git.checkout_branch(&params.worktree_path, &params.branch)?;
        self.git
            .set_upstream_branch(&params.worktree_path, &params.remote, &params.branch)?;
        Ok(())
    }

    fn register(&self, params: &CreateParams) -> Result<()> {
        let info = WorktreeInfo {
            branch: params.branch.clone(),
            remote: params.remote.clone(),
            path: params.worktree_path.clone(),
            workspace_path: None,
            issue: params.issue.clone(),
        };
        match self.store.add_worktree(&params.repo_id, info.clone()) {
            Ok(()) => Ok(()),
            Err(store::StoreError::RepositoryNotFound(_)) => {
                self.auto_register_repository(&params.repo_id, &params.repo_path)?;
                self.store.add_worktree(&params.repo_id, info)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn auto_register_repository(&self, repo_id: &str, repo_path: &Path) -> Result<()> {
        if !self.fs.exists(&repo_path.join(".git")) {
            return Err(CoreError::NotAGitRepository(repo_path.to_path_buf()));
        }
        let mut remotes = std::collections::BTreeMap::new();
        if let Ok(url) = self.git.get_remote_url(repo_path, "origin") {
            let default_branch = self.git.get_default_branch(&url).unwrap_or_default();
            remotes.insert("origin".to_string(), store::RemoteInfo { default_branch });
        }
        self.store.add_repository(repo_id, repo_path.to_path_buf(), remotes)?;
        Ok(())
    }

    fn rollback_directory(&self, worktree_path: &Path) {
        if let Err(e) = self.fs.remove_all(worktree_path) {
            tracing::error!(path = %worktree_path.display(), error = %e, "rollback cleanup failed");
        }
    }

    pub fn delete(&self, params: DeleteParams) -> Result<()> {
        // 1. Validate.
        self.store.get_worktree(&params.repo_id, &params.branch)?;

        // 2. Confirmation, unless forced.
        if !params.force {
            let proceed = self.prompt.confirm(
                &format!("Delete worktree '{}' at {}?", params.branch, params.worktree_path.display()),
                false,
            );
            if !proceed {
                return Err(CoreError::DeletionCancelled);
            }
        }

        // 3. Remove from Git. Tolerated: Git may already have forgotten it.
        if let Err(e) = self
            .git
            .remove_worktree(&params.repo_path, &params.worktree_path, params.force)
        {
            tracing::warn!(branch = params.branch, error = %e, "git worktree remove failed, continuing");
        }

        // 4. Remove the directory. Same tolerance.
        if let Err(e) = self.fs.remove_all(&params.worktree_path) {
            tracing::warn!(path = %params.worktree_path.display(), error = %e, "directory removal failed, continuing");
        }

        // 5. Remove from the registry. Fatal: disk/Git advanced but the
        // registry would disagree.
        self.store.remove_worktree(&params.repo_id, &params.branch)?;

        Ok(())
    }
}
