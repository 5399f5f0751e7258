//! Workspace Orchestrator (spec §4.7): fan a single logical operation
//! (create/delete a branch) out across every repository in a named
//! workspace, with rollback on partial create failure and an
//! abort-on-first-error policy for destructive deletes.

use std::path::PathBuf;

use git::GitCapability;
use serde::Serialize;
use store::StatusStore;

use crate::{
    config::Config,
    error::{CoreError, Result},
    filesystem::Filesystem,
    hooks::HookRegistry,
    prompt::Prompt,
    repository::{CreateWorktreeOpts, RepositoryOrchestrator},
};

pub struct WorkspaceOrchestrator<'a> {
    name: String,
    git: &'a dyn GitCapability,
    fs: &'a dyn Filesystem,
    store: &'a StatusStore,
    config: &'a dyn Config,
    prompt: &'a dyn Prompt,
    hooks: &'a HookRegistry,
}

pub struct WorkspaceWorktreeEntry {
    pub repo_id: String,
    pub branch: String,
    pub remote: String,
    pub worktree_path: PathBuf,
    pub workspace_file: Option<PathBuf>,
    pub issue: Option<store::IssueInfo>,
}

#[derive(Serialize)]
struct WorkspaceDescriptorFolder {
    path: PathBuf,
}

#[derive(Serialize)]
struct WorkspaceDescriptor {
    folders: Vec<WorkspaceDescriptorFolder>,
    settings: serde_json::Value,
    extensions: WorkspaceDescriptorExtensions,
}

#[derive(Serialize)]
struct WorkspaceDescriptorExtensions {
    recommendations: Vec<String>,
}

fn sanitize_branch(branch: &str) -> String {
    branch.replace('/', "-")
}

impl<'a> WorkspaceOrchestrator<'a> {
    pub fn new(
        name: String,
        git: &'a dyn GitCapability,
        fs: &'a dyn Filesystem,
        store: &'a StatusStore,
        config: &'a dyn Config,
        prompt: &'a dyn Prompt,
        hooks: &'a HookRegistry,
    ) -> Self {
        Self {
            name,
            git,
            fs,
            store,
            config,
            prompt,
            hooks,
        }
    }

    fn repository_orchestrator(&self, repo_id: &str, repo_path: PathBuf) -> RepositoryOrchestrator<'a> {
        RepositoryOrchestrator::new(
            repo_id.to_string(),
            repo_path,
            self.git,
            self.fs,
            self.store,
            self.config,
            self.prompt,
            self.hooks,
        )
    }

    fn branch_descriptor_path(&self, branch: &str) -> PathBuf {
        self.config
            .workspaces_dir()
            .join(format!("{}-{}.code-workspace", self.name, sanitize_branch(branch)))
    }

    fn main_descriptor_path(&self) -> PathBuf {
        self.config.workspaces_dir().join(format!("{}.code-workspace", self.name))
    }

    pub fn create_worktree(&self, branch: &str) -> Result<()> {
        let workspace = self.store.get_workspace(&self.name)?;
        let mut created: Vec<String> = Vec::new();

        for repo_id in &workspace.repositories {
            let repository = self.store.get_repository(repo_id)?;
            let orchestrator = self.repository_orchestrator(repo_id, repository.path);
            match orchestrator.create_worktree(branch, CreateWorktreeOpts::default()) {
                Ok(()) => created.push(repo_id.clone()),
                Err(e) => {
                    for rolled_back in &created {
                        if let Ok(repository) = self.store.get_repository(rolled_back) {
                            let orchestrator = self.repository_orchestrator(rolled_back, repository.path);
                            if let Err(rollback_err) = orchestrator.delete_worktree(branch, true) {
                                tracing::error!(
                                    repo_id = rolled_back,
                                    error = %rollback_err,
                                    "rollback of partially created workspace worktree failed"
                                );
                            }
                        }
                    }
                    return Err(e);
                }
            }
        }

        let descriptor = WorkspaceDescriptor {
            folders: workspace
                .repositories
                .iter()
                .filter_map(|repo_id| self.store.get_repository(repo_id).ok())
                .map(|repository| WorkspaceDescriptorFolder { path: repository.path })
                .collect(),
            settings: serde_json::json!({}),
            extensions: WorkspaceDescriptorExtensions { recommendations: Vec::new() },
        };
        let body = serde_json::to_vec_pretty(&descriptor).map_err(|e| CoreError::GitRepositoryInvalid(e.to_string()))?;
        self.fs.write_file(&self.branch_descriptor_path(branch), &body)?;

        self.store.update_workspace(&self.name, |workspace| {
            if !workspace.worktrees.iter().any(|b| b == branch) {
                workspace.worktrees.push(branch.to_string());
            }
        })?;

        Ok(())
    }

    pub fn delete_workspace(&self, force: bool) -> Result<()> {
        let workspace = self.store.get_workspace(&self.name)?;

        if !force {
            let proceed = self.prompt.confirm(
                &format!("Delete workspace '{}' and all its worktrees?", self.name),
                false,
            );
            if !proceed {
                return Err(CoreError::DeletionCancelled);
            }
        }

        for branch in &workspace.worktrees {
            for repo_id in &workspace.repositories {
                let repository = self.store.get_repository(repo_id)?;
                let orchestrator = self.repository_orchestrator(repo_id, repository.path);
                orchestrator.delete_worktree(branch, true)?;
            }
            let _ = self.fs.remove(&self.branch_descriptor_path(branch));
        }

        let _ = self.fs.remove(&self.main_descriptor_path());
        self.store.remove_workspace(&self.name)?;
        Ok(())
    }

    pub fn delete_worktree(&self, branch: &str, force: bool) -> Result<()> {
        let workspace = self.store.get_workspace(&self.name)?;
        for repo_id in &workspace.repositories {
            if self.store.get_worktree(repo_id, branch).is_err() {
                continue;
            }
            let repository = self.store.get_repository(repo_id)?;
            let orchestrator = self.repository_orchestrator(repo_id, repository.path);
            orchestrator.delete_worktree(branch, force)?;
        }
        let _ = self.fs.remove(&self.branch_descriptor_path(branch));
        self.store.update_workspace(&self.name, |workspace| {
            workspace.worktrees.retain(|b| b != branch);
        })?;
        Ok(())
    }

    pub fn delete_all_worktrees(&self, force: bool) -> Result<()> {
        let workspace = self.store.get_workspace(&self.name)?;
        let mut failures = Vec::new();
        let branches = workspace.worktrees.clone();
        for branch in &branches {
            if let Err(e) = self.delete_worktree(branch, force) {
                tracing::error!(branch, error = %e, "failed to delete workspace worktree");
                failures.push((branch.clone(), e.to_string()));
            }
        }
        if !branches.is_empty() && failures.len() == branches.len() {
            return Err(CoreError::AllWorktreesFailed(failures));
        }
        if !failures.is_empty() {
            return Err(CoreError::SomeWorktreesFailed(failures));
        }
        Ok(())
    }

    pub fn list_workspace_worktrees(&self) -> Result<Vec<WorkspaceWorktreeEntry>> {
        let workspace = self.store.get_workspace(&self.name)?;
        let mut entries = Vec::new();
        for repo_id in &workspace.repositories {
            for branch in &workspace.worktrees {
                if let Ok(worktree) = self.store.get_worktree(repo_id, branch) {
                    entries.push(WorkspaceWorktreeEntry {
                        repo_id: repo_id.clone(),
                        branch: branch.clone(),
                        remote: worktree.remote,
                        worktree_path: worktree.path,
                        workspace_file: worktree.workspace_path,
                        issue: worktree.issue,
                    });
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use git::{GitCliError, WorktreeEntry};
    use std::path::Path;

    use super::*;
    use crate::{config::StaticConfig, filesystem::InMemoryFilesystem, prompt::ScriptedPrompt};

    #[derive(Default)]
    struct FakeGit {
        fail_checkout_for: Option<String>,
    }

    impl GitCapability for FakeGit {
        fn status(&self, _: &Path) -> std::result::Result<String, GitCliError> {
            Ok(String::new())
        }
        fn is_clean(&self, _: &Path) -> std::result::Result<bool, GitCliError> {
            Ok(true)
        }
        fn get_repository_name(&self, _: &Path) -> std::result::Result<String, GitCliError> {
            Ok("local/repo".into())
        }
        fn remote_exists(&self, _: &Path, _: &str) -> std::result::Result<bool, GitCliError> {
            Ok(true)
        }
        fn get_remote_url(&self, _: &Path, _: &str) -> std::result::Result<String, GitCliError> {
            Ok("https://example.com/u/repo.git".into())
        }
        fn add_remote(&self, _: &Path, _: &str, _: &str) -> std::result::Result<(), GitCliError> {
            Ok(())
        }
        fn branch_exists(&self, _: &Path, _: &str) -> std::result::Result<bool, GitCliError> {
            Ok(true)
        }
        fn branch_exists_on_remote(&self, _: &Path, _: &str, _: &str) -> std::result::Result<bool, GitCliError> {
            Ok(false)
        }
        fn get_current_branch(&self, _: &Path) -> std::result::Result<String, GitCliError> {
            Ok("main".into())
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
        fn checkout_branch(&self, work_dir: &Path, _: &str) -> std::result::Result<(), GitCliError> {
            if let Some(fail_path) = &self.fail_checkout_for {
                if work_dir.to_string_lossy().contains(fail_path.as_str()) {
                    return Err(GitCliError::GitFailure("checkout failed".into()));
                }
            }
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

    fn setup(fs: &InMemoryFilesystem, store: &StatusStore, repo_b_path: &str) {
        store.initialize().unwrap();
        store.add_repository("a", PathBuf::from("/repos/a"), BTreeMap::new()).unwrap();
        store.add_repository("b", PathBuf::from(repo_b_path), BTreeMap::new()).unwrap();
        store
            .add_workspace(
                "proj",
                store::Workspace {
                    repositories: vec!["a".to_string(), "b".to_string()],
                    worktrees: Vec::new(),
                },
            )
            .unwrap();
        let _ = fs;
    }

    #[test]
    fn create_worktree_rolls_back_on_partial_failure() {
        let git = FakeGit {
            fail_checkout_for: Some("/repos/b".to_string()),
        };
        let fs = InMemoryFilesystem::new();
        let hooks = HookRegistry::new();
        let prompt = ScriptedPrompt::default();
        let config = StaticConfig {
            repositories_dir: PathBuf::from("/repos"),
            workspaces_dir: PathBuf::from("/workspaces"),
            status_file: PathBuf::from("/status.toml"),
        };
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.toml"));
        setup(&fs, &store, "/repos/b");

        let orchestrator = WorkspaceOrchestrator::new("proj".into(), &git, &fs, &store, &config, &prompt, &hooks);
        let err = orchestrator.create_worktree("dev").unwrap_err();
        assert!(matches!(err, CoreError::GitFailure(_)));

        assert!(store.get_worktree("a", "dev").is_err());
        assert!(store.get_worktree("b", "dev").is_err());
        assert!(!fs.exists(&PathBuf::from("/workspaces/proj-dev.code-workspace")));
        let workspace = store.get_workspace("proj").unwrap();
        assert!(!workspace.worktrees.contains(&"dev".to_string()));
    }

    #[test]
    fn create_worktree_succeeds_and_emits_descriptor() {
        let git = FakeGit::default();
        let fs = InMemoryFilesystem::new();
        let hooks = HookRegistry::new();
        let prompt = ScriptedPrompt::default();
        let config = StaticConfig {
            repositories_dir: PathBuf::from("/repos"),
            workspaces_dir: PathBuf::from("/workspaces"),
            status_file: PathBuf::from("/status.toml"),
        };
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path().join("status.toml"));
        setup(&fs, &store, "/repos/b");

        let orchestrator = WorkspaceOrchestrator::new("proj".into(), &git, &fs, &store, &config, &prompt, &hooks);
        orchestrator.create_worktree("dev").unwrap();

        assert!(store.get_worktree("a", "dev").is_ok());
        assert!(store.get_worktree("b", "dev").is_ok());
        assert!(fs.exists(&PathBuf::from("/workspaces/proj-dev.code-workspace")));
        let workspace = store.get_workspace("proj").unwrap();
        assert!(workspace.worktrees.contains(&"dev".to_string()));
    }
}
