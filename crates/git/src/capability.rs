use std::path::{Path, PathBuf};

use crate::{GitCliError, WorktreeEntry};

/// Capability interface over the Git operations the worktree engine and
/// orchestrators need (spec §4.3). `GitCli` is the real implementation;
/// tests use an in-memory fake instead of a mock-generation framework.
pub trait GitCapability: Send + Sync {
    fn status(&self, work_dir: &Path) -> Result<String, GitCliError>;
    fn is_clean(&self, work_dir: &Path) -> Result<bool, GitCliError>;
    fn get_repository_name(&self, work_dir: &Path) -> Result<String, GitCliError>;
    fn remote_exists(&self, work_dir: &Path, remote: &str) -> Result<bool, GitCliError>;
    fn get_remote_url(&self, work_dir: &Path, remote: &str) -> Result<String, GitCliError>;
    fn add_remote(&self, work_dir: &Path, remote: &str, url: &str) -> Result<(), GitCliError>;
    fn branch_exists(&self, work_dir: &Path, branch: &str) -> Result<bool, GitCliError>;
    fn branch_exists_on_remote(
        &self,
        work_dir: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<bool, GitCliError>;
    fn get_current_branch(&self, work_dir: &Path) -> Result<String, GitCliError>;
    fn get_default_branch(&self, remote_url: &str) -> Result<String, GitCliError>;
    fn fetch_remote(&self, work_dir: &Path, remote: &str) -> Result<(), GitCliError>;
    fn set_upstream_branch(
        &self,
        worktree_path: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<(), GitCliError>;
    fn create_branch_from(&self, work_dir: &Path, new: &str, from: &str) -> Result<(), GitCliError>;
    fn check_reference_conflict(&self, work_dir: &Path, branch: &str) -> Result<(), GitCliError>;
    fn create_worktree_with_no_checkout(
        &self,
        work_dir: &Path,
        worktree_path: &Path,
        branch: &str,
    ) -> Result<(), GitCliError>;
    fn checkout_branch(&self, worktree_path: &Path, branch: &str) -> Result<(), GitCliError>;
    fn remove_worktree(
        &self,
        work_dir: &Path,
        worktree_path: &Path,
        force: bool,
    ) -> Result<(), GitCliError>;
    fn get_worktree_path(&self, work_dir: &Path, branch: &str) -> Result<PathBuf, GitCliError>;
    fn worktree_exists(&self, work_dir: &Path, branch: &str) -> Result<bool, GitCliError>;
    fn clone(&self, repo_url: &str, target_path: &Path, recursive: bool) -> Result<(), GitCliError>;
    fn clone_to_path(
        &self,
        source_path: &Path,
        target_path: &Path,
        branch: &str,
    ) -> Result<(), GitCliError>;
    fn list_worktrees(&self, work_dir: &Path) -> Result<Vec<WorktreeEntry>, GitCliError>;
}

impl GitCapability for crate::GitCli {
    fn status(&self, work_dir: &Path) -> Result<String, GitCliError> {
        crate::GitCli::status(self, work_dir)
    }
    fn is_clean(&self, work_dir: &Path) -> Result<bool, GitCliError> {
        crate::GitCli::is_clean(self, work_dir)
    }
    fn get_repository_name(&self, work_dir: &Path) -> Result<String, GitCliError> {
        crate::GitCli::get_repository_name(self, work_dir)
    }
    fn remote_exists(&self, work_dir: &Path, remote: &str) -> Result<bool, GitCliError> {
        crate::GitCli::remote_exists(self, work_dir, remote)
    }
    fn get_remote_url(&self, work_dir: &Path, remote: &str) -> Result<String, GitCliError> {
        crate::GitCli::get_remote_url(self, work_dir, remote)
    }
    fn add_remote(&self, work_dir: &Path, remote: &str, url: &str) -> Result<(), GitCliError> {
        crate::GitCli::add_remote(self, work_dir, remote, url)
    }
    fn branch_exists(&self, work_dir: &Path, branch: &str) -> Result<bool, GitCliError> {
        crate::GitCli::branch_exists(self, work_dir, branch)
    }
    fn branch_exists_on_remote(
        &self,
        work_dir: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<bool, GitCliError> {
        crate::GitCli::branch_exists_on_remote(self, work_dir, remote, branch)
    }
    fn get_current_branch(&self, work_dir: &Path) -> Result<String, GitCliError> {
        crate::GitCli::get_current_branch(self, work_dir)
    }
    fn get_default_branch(&self, remote_url: &str) -> Result<String, GitCliError> {
        crate::GitCli::get_default_branch(self, remote_url)
    }
    fn fetch_remote(&self, work_dir: &Path, remote: &str) -> Result<(), GitCliError> {
        crate::GitCli::fetch_remote(self, work_dir, remote)
    }
    fn set_upstream_branch(
        &self,
        worktree_path: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<(), GitCliError> {
        crate::GitCli::set_upstream_branch(self, worktree_path, remote, branch)
    }
    fn create_branch_from(&self, work_dir: &Path, new: &str, from: &str) -> Result<(), GitCliError> {
        crate::GitCli::create_branch_from(self, work_dir, new, from)
    }
    fn check_reference_conflict(&self, work_dir: &Path, branch: &str) -> Result<(), GitCliError> {
        crate::GitCli::check_reference_conflict(self, work_dir, branch)
    }
    fn create_worktree_with_no_checkout(
        &self,
        work_dir: &Path,
        worktree_path: &Path,
        branch: &str,
    ) -> Result<(), GitCliError> {
        crate::GitCli::create_worktree_with_no_checkout(self, work_dir, worktree_path, branch)
    }
    fn checkout_branch(&self, worktree_path: &Path, branch: &str) -> Result<(), GitCliError> {
        crate::GitCli::checkout_branch(self, worktree_path, branch)
    }
    fn remove_worktree(
        &self,
        work_dir: &Path,
        worktree_path: &Path,
        force: bool,
    ) -> Result<(), GitCliError> {
        crate::GitCli::remove_worktree(self, work_dir, worktree_path, force)
    }
    fn get_worktree_path(&self, work_dir: &Path, branch: &str) -> Result<PathBuf, GitCliError> {
        crate::GitCli::get_worktree_path(self, work_dir, branch)
    }
    fn worktree_exists(&self, work_dir: &Path, branch: &str) -> Result<bool, GitCliError> {
        crate::GitCli::worktree_exists(self, work_dir, branch)
    }
    fn clone(&self, repo_url: &str, target_path: &Path, recursive: bool) -> Result<(), GitCliError> {
        crate::GitCli::clone(self, repo_url, target_path, recursive)
    }
    fn clone_to_path(
        &self,
        source_path: &Path,
        target_path: &Path,
        branch: &str,
    ) -> Result<(), GitCliError> {
        crate::GitCli::clone_to_path(self, source_path, target_path, branch)
    }
    fn list_worktrees(&self, work_dir: &Path) -> Result<Vec<WorktreeEntry>, GitCliError> {
        crate::GitCli::list_worktrees(self, work_dir)
    }
}
