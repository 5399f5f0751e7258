//! Repository Orchestrator (spec §4.6): operations scoped to a single
//! repository — validation, remote management, and the worktree
//! lifecycle calls delegated to the [`crate::engine::WorktreeEngine`].

use std::path::{Path, PathBuf};

use git::GitCapability;
use store::StatusStore;

use crate::{
    config::Config,
    engine::{CreateParams, DeleteParams, WorktreeEngine},
    error::{CoreError, Result},
    filesystem::Filesystem,
    hooks::HookRegistry,
    prompt::Prompt,
};

#[derive(Default)]
pub struct CreateWorktreeOpts {
    pub remote: Option<String>,
    pub issue: Option<store::IssueInfo>,
    pub force: bool,
    pub detached: bool,
}

pub struct RepositoryOrchestrator<'a> {
    repo_id: String,
    repo_path: PathBuf,
    git: &'a dyn GitCapability,
    fs: &'a dyn Filesystem,
    store: &'a StatusStore,
    config: &'a dyn Config,
    prompt: &'a dyn Prompt,
    hooks: &'a HookRegistry,
}

impl<'a> RepositoryOrchestrator<'a> {
    /// Resolve a caller-supplied repository name to `(repoId, repoPath)`: a
    /// name already known to the store wins; otherwise it is treated as a
    /// path (absolute as-is, relative joined to `current_dir`); empty
    /// means `current_dir` itself.
    pub fn resolve(
        name: &str,
        current_dir: &Path,
        store: &StatusStore,
        git: &dyn GitCapability,
    ) -> Result<(String, PathBuf)> {
        if name.is_empty() {
            let repo_path = current_dir.to_path_buf();
            let repo_id = git.get_repository_name(&repo_path)?;
            return Ok((repo_id, repo_path));
        }
        if let Ok(repository) = store.get_repository(name) {
            return Ok((name.to_string(), repository.path));
        }
        let repo_path = if Path::new(name).is_absolute() {
            PathBuf::from(name)
        } else {
            current_dir.join(name)
        };
        let repo_id = git.get_repository_name(&repo_path)?;
        Ok((repo_id, repo_path))
    }

    pub fn new(
        repo_id: String,
        repo_path: PathBuf,
        git: &'a dyn GitCapability,
        fs: &'a dyn Filesystem,
        store: &'a StatusStore,
        config: &'a dyn Config,
        prompt: &'a dyn Prompt,
        hooks: &'a HookRegistry,
    ) -> Self {
        Self {
            repo_id,
            repo_path,
            git,
            fs,
            store,
            config,
            prompt,
            hooks,
        }
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn is_git_repository(&self) -> Result<bool> {
        let dot_git = self.repo_path.join(".git");
        if !self.fs.exists(&dot_git) {
            return Ok(false);
        }
        if self.fs.is_dir(&dot_git) {
            return Ok(true);
        }
        let contents = self.fs.read_file(&dot_git).map_err(CoreError::FilesystemError)?;
        Ok(contents.starts_with(b"gitdir: "))
    }

    pub fn validate_git_status(&self) -> Result<()> {
        let status = self
            .git
            .status(&self.repo_path)
            .map_err(|e| CoreError::GitRepositoryInvalid(e.to_string()))?;
        if status.trim().is_empty() {
            return Err(CoreError::GitRepositoryInvalid(
                "git status produced no output".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_git_configuration(&self, work_dir: &Path) -> Result<()> {
        self.git
            .get_current_branch(work_dir)
            .map_err(|e| CoreError::GitRepositoryInvalid(e.to_string()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_git_repository()? {
            return Err(CoreError::NotAGitRepository(self.repo_path.clone()));
        }
        self.validate_git_status()?;
        self.validate_git_configuration(&self.repo_path)?;
        Ok(())
    }

    pub fn validate_repository(&self, branch: Option<&str>) -> Result<()> {
        self.validate()?;
        if let Some(branch) = branch {
            if self.store.get_worktree(&self.repo_id, branch).is_ok() {
                return Err(CoreError::WorktreeExists {
                    repo_id: self.repo_id.clone(),
                    branch: branch.to_string(),
                });
            }
            if !self.git.is_clean(&self.repo_path).map_err(CoreError::from)? {
                return Err(CoreError::RepositoryNotClean(self.repo_path.clone()));
            }
        }
        Ok(())
    }

    /// `"origin"` is always assumed registered; any other remote is added
    /// (constructing its URL from origin's) only if it is not already
    /// known to Git.
    pub fn handle_remote_management(&self, remote: &str) -> Result<()> {
        if remote == "origin" {
            return Ok(());
        }
        if self.git.remote_exists(&self.repo_path, remote).map_err(CoreError::from)? {
            return Ok(());
        }
        let url = self.construct_remote_url(remote)?;
        self.git
            .add_remote(&self.repo_path, remote, &url)
            .map_err(CoreError::from)?;
        Ok(())
    }

    pub fn construct_remote_url(&self, remote: &str) -> Result<String> {
        let origin_url = self
            .git
            .get_remote_url(&self.repo_path, "origin")
            .map_err(|_| CoreError::OriginRemoteNotFound(self.repo_path.clone()))?;
        Ok(git::url::construct_remote_url(&origin_url, remote, &self.repo_id)?)
    }

    pub fn build_path(&self, remote: &str, branch: &str) -> PathBuf {
        self.config
            .repositories_dir()
            .join(&self.repo_id)
            .join(remote)
            .join(branch)
    }

    fn engine(&self) -> WorktreeEngine<'_> {
        WorktreeEngine::new(self.git, self.fs, self.store, self.prompt, self.hooks)
    }

    pub fn create_worktree(&self, branch: &str, opts: CreateWorktreeOpts) -> Result<()> {
        let remote = opts.remote.unwrap_or_else(|| "origin".to_string());
        let worktree_path = self.build_path(&remote, branch);
        self.engine().create(CreateParams {
            repo_id: self.repo_id.clone(),
            branch: branch.to_string(),
            worktree_path,
            repo_path: self.repo_path.clone(),
            remote,
            issue: opts.issue,
            force: opts.force,
            detached: opts.detached,
        })
    }

    /// Load an existing branch from `remote_source` (defaulting to
    /// `origin`) as a new worktree. Requires an existing repository at
    /// the current path (spec §9 open question, resolved in favor of
    /// requiring one).
    pub fn load_worktree(&self, remote_source: Option<&str>, branch_name: &str) -> Result<()> {
        self.validate()?;
        let remote = remote_source.unwrap_or("origin");
        self.handle_remote_management(remote)?;
        self.git.fetch_remote(&self.repo_path, remote).map_err(CoreError::from)?;
        let exists = self
            .git
            .branch_exists_on_remote(&self.repo_path, remote, branch_name)
            .map_err(CoreError::from)?;
        if !exists {
            return Err(CoreError::BranchNotFoundOnRemote {
                remote: remote.to_string(),
                branch: branch_name.to_string(),
            });
        }
        self.create_worktree(
            branch_name,
            CreateWorktreeOpts {
                remote: Some(remote.to_string()),
                ..Default::default()
            },
        )
    }

    /// Downgrades to registry-only cleanup when Git no longer knows about
    /// the worktree (spec §4.6, §7 reconciliation).
    pub fn delete_worktree(&self, branch: &str, force: bool) -> Result<()> {
        let worktree_path = match self.git.get_worktree_path(&self.repo_path, branch) {
            Ok(path) => path,
            Err(_) => {
                self.store.remove_worktree(&self.repo_id, branch)?;
                return Ok(());
            }
        };
        self.engine().delete(DeleteParams {
            repo_id: self.repo_id.clone(),
            branch: branch.to_string(),
            worktree_path,
            repo_path: self.repo_path.clone(),
            force,
        })
    }

    pub fn delete_all_worktrees(&self, force: bool) -> Result<()> {
        let worktrees = self.list_worktrees()?;
        let mut failures = Vec::new();
        for worktree in &worktrees {
            if let Err(e) = self.delete_worktree(&worktree.branch, force) {
                tracing::error!(branch = worktree.branch, error = %e, "failed to delete worktree");
                failures.push((worktree.branch.clone(), e.to_string()));
            }
        }
        if !worktrees.is_empty() && failures.len() == worktrees.len() {
            return Err(CoreError::AllWorktreesFailed(failures));
        }
        if !failures.is_empty() {
            return Err(CoreError::SomeWorktreesFailed(failures));
        }
        Ok(())
    }

    pub fn list_worktrees(&self) -> Result<Vec<store::WorktreeInfo>> {
        Ok(self.store.list_worktrees(&self.repo_id)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use git::{GitCliError, WorktreeEntry};

    use super::*;
    use crate::{config::StaticConfig, filesystem::InMemoryFilesystem, prompt::AutoAnswerPrompt};

    #[derive(Default)]
    struct FakeGit {
        status_output: String,
        clean: bool,
        current_branch: String,
        remote_url: String,
        remote_branch_exists: bool,
    }

    impl GitCapability for FakeGit {
        fn status(&self, _: &Path) -> std::result::Result<String, GitCliError> {
            Ok(self.status_output.clone())
        }
        fn is_clean(&self, _: &Path) -> std::result::Result<bool, GitCliError> {
            Ok(self.clean)
        }
        fn get_repository_name(&self, _: &Path) -> std::result::Result<String, GitCliError> {
            Ok("github.com/u/repo".into())
        }
        fn remote_exists(&self, _: &Path, remote: &str) -> std::result::Result<bool, GitCliError> {
            Ok(remote == "origin")
        }
        fn get_remote_url(&self, _: &Path, _: &str) -> std::result::Result<String, GitCliError> {
            Ok(self.remote_url.clone())
        }
        fn add_remote(&self, _: &Path, _: &str, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn branch_exists(&self, _: &Path, _: &str) -> std::result::Result<bool, GitCliError> {
            Ok(false)
        }
        fn branch_exists_on_remote(&self, _: &Path, _: &str, _: &str) -> std::result::Result<bool, GitCliError> {
            Ok(self.remote_branch_exists)
        }
        fn get_current_branch(&self, _: &Path) -> std::result::Result<String, GitCliError> {
            if self.current_branch.is_empty() {
                Err(GitCliError::GitFailure("not a repo".into()))
            } else {
                Ok(self.current_branch.clone())
            }
        }
        fn get_default_branch(&self, _: &str) -> std::result::Result<String, GitCliError> {
            Ok("main".into())
        }
        fn fetch_remote(&self, _: &Path, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn set_upstream_branch(&self, _: &Path, _: &str, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn create_branch_from(&self, _: &Path, _: &str, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn check_reference_conflict(&self, _: &Path, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn create_worktree_with_no_checkout(&self, _: &Path, _: &Path, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn checkout_branch(&self, _: &Path, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn remove_worktree(&self, _: &Path, _: &Path, _: bool) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn get_worktree_path(&self, _: &Path, _: &str) -> std::result::Result<PathBuf, GitCliError> {
            Err(GitCliError::GitFailure("not found".into()))
        }
        fn worktree_exists(&self, _: &Path, _: &str) -> std::result::Result<bool, GitCliError> {
            Ok(true)
        }
        fn clone(&self, _: &str, _: &Path, _: bool) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn clone_to_path(&self, _: &Path, _: &Path, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn list_worktrees(&self, _: &Path) -> std::result::Result<Vec<WorktreeEntry>, GitCliError> {
            Ok(Vec::new())
        }
    }

    fn config() -> StaticConfig {
        StaticConfig {
            repositories_dir: PathBuf::from("/repos"),
            workspaces_dir: PathBuf::from("/workspaces"),
            status_file: PathBuf::from("/status.toml"),
        }
    }

    #[test]
    fn build_path_nests_branch_slashes() {
        let git = FakeGit::default();
        let fs = InMemoryFilesystem::new();
        let hooks = HookRegistry::new();
        let prompt = AutoAnswerPrompt;
        let config = config();
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.toml"));
        store.initialize().unwrap();
        let orchestrator = RepositoryOrchestrator::new(
            "github.com/u/repo".into(),
            PathBuf::from("/repos/github.com/u/repo"),
            &git,
            &fs,
            &store,
            &config,
            &prompt,
            &hooks,
        );
        assert_eq!(
            orchestrator.build_path("origin", "feature/x"),
            PathBuf::from("/repos/github.com/u/repo/origin/feature/x")
        );
    }

    #[test]
    fn validate_requires_dot_git_directory() {
        let git = FakeGit::default();
        let fs = InMemoryFilesystem::new();
        let hooks = HookRegistry::new();
        let prompt = AutoAnswerPrompt;
        let config = config();
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.toml"));
        store.initialize().unwrap();
        let repo_path = PathBuf::from("/repos/a");
        let orchestrator = RepositoryOrchestrator::new(
            "a".into(),
            repo_path,
            &git,
            &fs,
            &store,
            &config,
            &prompt,
            &hooks,
        );
        let err = orchestrator.validate().unwrap_err();
        assert!(matches!(err, CoreError::NotAGitRepository(_)));
    }

    #[test]
    fn validate_repository_rejects_dirty_tree_when_branch_given() {
        let git = FakeGit {
            status_output: "## main".into(),
            clean: false,
            current_branch: "main".into(),
            ..Default::default()
        };
        let fs = InMemoryFilesystem::new();
        fs.mkdir_all(&PathBuf::from("/repos/a/.git")).unwrap();
        let hooks = HookRegistry::new();
        let prompt = AutoAnswerPrompt;
        let config = config();
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.toml"));
        store.initialize().unwrap();
        store
            .add_repository("a", PathBuf::from("/repos/a"), BTreeMap::new())
            .unwrap();
        let orchestrator = RepositoryOrchestrator::new(
            "a".into(),
            PathBuf::from("/repos/a"),
            &git,
            &fs,
            &store,
            &config,
            &prompt,
            &hooks,
        );
        let err = orchestrator.validate_repository(Some("feature/x")).unwrap_err();
        assert!(matches!(err, CoreError::RepositoryNotClean(_)));
    }

    #[test]
    fn delete_worktree_downgrades_to_registry_only_cleanup_when_git_forgot_it() {
        let git = FakeGit::default();
        let fs = InMemoryFilesystem::new();
        let hooks = HookRegistry::new();
        let prompt = AutoAnswerPrompt;
        let config = config();
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.toml"));
        store.initialize().unwrap();
        store
            .add_repository("a", PathBuf::from("/repos/a"), BTreeMap::new())
            .unwrap();
        store
            .add_worktree(
                "a",
                store::WorktreeInfo {
                    branch: "feature/x".into(),
                    remote: "origin".into(),
                    path: PathBuf::from("/repos/a/origin/feature/x"),
                    workspace_path: None,
                    issue: None,
                },
            )
            .unwrap();
        let orchestrator = RepositoryOrchestrator::new(
            "a".into(),
            PathBuf::from("/repos/a"),
            &git,
            &fs,
            &store,
            &config,
            &prompt,
            &hooks,
        );
        orchestrator.delete_worktree("feature/x", true).unwrap();
        assert!(store.get_worktree("a", "feature/x").is_err());
    }

    #[test]
    fn load_worktree_fails_when_branch_absent_on_remote() {
        let git = FakeGit {
            status_output: "## main".into(),
            clean: true,
            current_branch: "main".into(),
            remote_url: "https://github.com/u/repo.git".into(),
            remote_branch_exists: false,
        };
        let fs = InMemoryFilesystem::new();
        fs.mkdir_all(&PathBuf::from("/repos/a/.git")).unwrap();
        let hooks = HookRegistry::new();
        let prompt = AutoAnswerPrompt;
        let config = config();
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.toml"));
        store.initialize().unwrap();
        store
            .add_repository("a", PathBuf::from("/repos/a"), BTreeMap::new())
            .unwrap();
        let orchestrator = RepositoryOrchestrator::new(
            "a".into(),
            PathBuf::from("/repos/a"),
            &git,
            &fs,
            &store,
            &config,
            &prompt,
            &hooks,
        );
        let err = orchestrator.load_worktree(None, "feature/x").unwrap_err();
        assert!(matches!(err, CoreError::BranchNotFoundOnRemote { .. }));
    }
}
