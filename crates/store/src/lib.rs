//! The Status Store (spec §4.1): a single-writer, advisory-locked,
//! whole-file registry of repositories and workspaces. Every mutating
//! operation is `withLock { load; mutate; save; }`; reads that don't need
//! transactional consistency with a following write bypass the lock.

pub mod error;
pub mod model;

use std::{
    fs::{File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use fs4::fs_std::FileExt;
pub use model::{IssueInfo, RemoteInfo, Registry, Repository, Workspace, WorktreeInfo};

pub use error::{Result, StoreError};

/// A held advisory lock on the registry file. Released on drop, which
/// covers every exit path (including early returns via `?`) inside
/// `with_lock`.
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

pub struct StatusStore {
    registry_path: PathBuf,
}

impl StatusStore {
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
        }
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Create an empty registry file if missing. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        if self.registry_path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.registry_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.save_registry(&Registry::default())
    }

    /// Parse the current file. Fails with `RegistryCorrupt` if unparseable.
    pub fn load_registry(&self) -> Result<Registry> {
        if !self.registry_path.exists() {
            return Ok(Registry::default());
        }
        let mut file = File::open(&self.registry_path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(Registry::default());
        }
        Ok(toml::from_str(&contents)?)
    }

    /// Serialize and atomically replace the file: write a sibling temp
    /// file, fsync it, then rename into place. A crash mid-update leaves
    /// the previous file intact.
    pub fn save_registry(&self, registry: &Registry) -> Result<()> {
        let serialized = toml::to_string_pretty(registry)?;
        let dir = self
            .registry_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.registry_path)
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Acquire an advisory exclusive lock on the registry file, load it,
    /// hand it to `f`, save it back if `f` succeeds, and release the lock
    /// on every exit path. No external I/O (Git, prompts) may happen
    /// inside `f` — lock hold time is bounded to load + mutate + write.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut Registry) -> Result<T>) -> Result<T> {
        if let Some(parent) = self.registry_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.registry_path)?;
        FileExt::lock_exclusive(&lock_file)
            .map_err(|_| StoreError::LockUnavailable(self.registry_path.clone()))?;
        let _guard = LockGuard { file: lock_file };

        let mut registry = self.load_registry()?;
        let result = f(&mut registry)?;
        self.save_registry(&registry)?;
        Ok(result)
    }

    pub fn get_repository(&self, id: &str) -> Result<Repository> {
        self.load_registry()?
            .repositories
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::RepositoryNotFound(id.to_string()))
    }

    pub fn add_repository(&self, id: &str, path: PathBuf, remotes: std::collections::BTreeMap<String, RemoteInfo>) -> Result<()> {
        self.with_lock(|registry| {
            if registry.repositories.contains_key(id) {
                return Err(StoreError::RepositoryExists(id.to_string()));
            }
            registry.repositories.insert(
                id.to_string(),
                Repository {
                    path,
                    remotes,
                    worktrees: Default::default(),
                },
            );
            Ok(())
        })
    }

    /// Removes the repository, cascading to its worktrees. Fails if the
    /// repository still belongs to any workspace (exclusivity invariant).
    pub fn remove_repository(&self, id: &str) -> Result<()> {
        self.with_lock(|registry| {
            if !registry.repositories.contains_key(id) {
                return Err(StoreError::RepositoryNotFound(id.to_string()));
            }
            for (name, workspace) in registry.workspaces.iter() {
                if workspace.repositories.iter().any(|r| r == id) {
                    return Err(StoreError::RepositoryInWorkspace {
                        repo_id: id.to_string(),
                        workspace: name.clone(),
                    });
                }
            }
            registry.repositories.remove(id);
            Ok(())
        })
    }

    pub fn get_worktree(&self, repo_id: &str, branch: &str) -> Result<WorktreeInfo> {
        let repository = self.get_repository(repo_id)?;
        repository
            .worktrees
            .get(branch)
            .cloned()
            .ok_or_else(|| StoreError::WorktreeNotFound {
                repo_id: repo_id.to_string(),
                branch: branch.to_string(),
            })
    }

    pub fn add_worktree(&self, repo_id: &str, info: WorktreeInfo) -> Result<()> {
        self.with_lock(|registry| {
            let repository = registry
                .repositories
                .get_mut(repo_id)
                .ok_or_else(|| StoreError::RepositoryNotFound(repo_id.to_string()))?;
            if repository.worktrees.contains_key(&info.branch) {
                return Err(StoreError::WorktreeExists {
                    repo_id: repo_id.to_string(),
                    branch: info.branch.clone(),
                });
            }
            repository.worktrees.insert(info.branch.clone(), info);
            Ok(())
        })
    }

    /// Idempotent with respect to already-absent entries.
    pub fn remove_worktree(&self, repo_id: &str, branch: &str) -> Result<()> {
        self.with_lock(|registry| {
            if let Some(repository) = registry.repositories.get_mut(repo_id) {
                repository.worktrees.remove(branch);
            }
            Ok(())
        })
    }

    /// Sorted by branch name, empty when the repository is unknown.
    pub fn list_worktrees(&self, repo_id: &str) -> Result<Vec<WorktreeInfo>> {
        let registry = self.load_registry()?;
        let Some(repository) = registry.repositories.get(repo_id) else {
            return Ok(Vec::new());
        };
        Ok(repository.worktrees.values().cloned().collect())
    }

    pub fn list_workspaces(&self) -> Result<Vec<(String, Workspace)>> {
        let registry = self.load_registry()?;
        Ok(registry.workspaces.into_iter().collect())
    }

    pub fn get_workspace(&self, name: &str) -> Result<Workspace> {
        self.load_registry()?
            .workspaces
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::WorkspaceNotFound(name.to_string()))
    }

    pub fn add_workspace(&self, name: &str, workspace: Workspace) -> Result<()> {
        self.with_lock(|registry| {
            if registry.workspaces.contains_key(name) {
                return Err(StoreError::WorkspaceExists(name.to_string()));
            }
            registry.workspaces.insert(name.to_string(), workspace);
            Ok(())
        })
    }

    pub fn update_workspace(&self, name: &str, f: impl FnOnce(&mut Workspace)) -> Result<()> {
        self.with_lock(|registry| {
            let workspace = registry
                .workspaces
                .get_mut(name)
                .ok_or_else(|| StoreError::WorkspaceNotFound(name.to_string()))?;
            f(workspace);
            Ok(())
        })
    }

    pub fn remove_workspace(&self, name: &str) -> Result<()> {
        self.with_lock(|registry| {
            if registry.workspaces.remove(name).is_none() {
                return Err(StoreError::WorkspaceNotFound(name.to_string()));
            }
            Ok(())
        })
    }
}
