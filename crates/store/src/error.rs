use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("registry file is corrupt: {0}")]
    RegistryCorrupt(#[from] toml::de::Error),
    #[error("failed to serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),
    #[error("repository already exists: {0}")]
    RepositoryExists(String),
    #[error("worktree not found: {repo_id}/{branch}")]
    WorktreeNotFound { repo_id: String, branch: String },
    #[error("worktree already exists: {repo_id}/{branch}")]
    WorktreeExists { repo_id: String, branch: String },
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),
    #[error("workspace already exists: {0}")]
    WorkspaceExists(String),
    #[error("repository {repo_id} still belongs to workspace {workspace}")]
    RepositoryInWorkspace { repo_id: String, workspace: String },
    #[error("cannot acquire advisory lock on {0}")]
    LockUnavailable(PathBuf),
}

pub type Result<T> = std::result::Result<T, StoreError>;
