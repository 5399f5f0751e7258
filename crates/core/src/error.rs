//! Error taxonomy (spec §7). Kinds, not type names: every variant here is
//! one of the spec's named kinds so higher layers can match by kind
//! rather than by string. Components wrap lower-layer errors with
//! context while preserving the original kind via `#[from]`/`#[error(transparent)]`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // --- Input errors: surfaced immediately, no state mutated ---
    #[error("missing required parameter: {0}")]
    MissingParameter(String),
    #[error("invalid repository name: {0}")]
    InvalidRepositoryName(String),
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),
    #[error(transparent)]
    InvalidURL(#[from] git::url::UrlError),

    // --- Not-found ---
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),
    #[error("worktree not found: {repo_id}/{branch}")]
    WorktreeNotFound { repo_id: String, branch: String },
    #[error("branch '{branch}' not found on remote '{remote}'")]
    BranchNotFoundOnRemote { remote: String, branch: String },
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    // --- Already-exists ---
    #[error("repository already exists: {0}")]
    RepositoryExists(String),
    #[error("worktree already exists: {repo_id}/{branch}")]
    WorktreeExists { repo_id: String, branch: String },
    #[error("directory already exists: {0}")]
    DirectoryExists(PathBuf),

    // --- State invariant violations: fatal for the current operation ---
    #[error("not a git repository: {0}")]
    NotAGitRepository(PathBuf),
    #[error("git repository invalid: {0}")]
    GitRepositoryInvalid(String),
    #[error("repository has uncommitted changes: {0}")]
    RepositoryNotClean(PathBuf),
    #[error("origin remote not found in {0}")]
    OriginRemoteNotFound(PathBuf),
    #[error("origin remote has an invalid URL: {0}")]
    OriginRemoteInvalidURL(String),
    #[error("hook '{phase}' failed: {message}")]
    HookFailed { phase: String, message: String },

    // --- External failures: the engine's compensation path has already run ---
    #[error(transparent)]
    GitFailure(#[from] git::GitCliError),
    #[error(transparent)]
    FilesystemError(#[from] std::io::Error),
    #[error(transparent)]
    StoreError(#[from] store::StoreError),

    // --- User cancellation: distinct from error ---
    #[error("deletion cancelled by user")]
    DeletionCancelled,

    // --- Partial: batch operations with per-element diagnostics ---
    #[error("failed to delete all worktrees: {0:?}")]
    AllWorktreesFailed(Vec<(String, String)>),
    #[error("some worktrees failed to delete: {0:?}")]
    SomeWorktreesFailed(Vec<(String, String)>),

    #[error("dependency container missing {0}")]
    IncompleteContainer(&'static str),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CoreError>,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Wrap an error with a human-readable context prefix while keeping
    /// the original kind reachable via `std::error::Error::source`.
    pub fn context(self, context: impl Into<String>) -> CoreError {
        CoreError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True if this error (or something it wraps) is the given not-found kind.
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::RepositoryNotFound(_)
            | CoreError::WorktreeNotFound { .. }
            | CoreError::WorkspaceNotFound(_) => true,
            CoreError::Context { source, .. } => source.is_not_found(),
            CoreError::StoreError(e) => matches!(
                e,
                store::StoreError::RepositoryNotFound(_)
                    | store::StoreError::WorktreeNotFound { .. }
                    | store::StoreError::WorkspaceNotFound(_)
            ),
            _ => false,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        match self {
            CoreError::RepositoryExists(_)
            | CoreError::WorktreeExists { .. }
            | CoreError::DirectoryExists(_) => true,
            CoreError::Context { source, .. } => source.is_already_exists(),
            CoreError::StoreError(e) => matches!(
                e,
                store::StoreError::RepositoryExists(_) | store::StoreError::WorktreeExists { .. }
            ),
            _ => false,
        }
    }
}

pub trait ResultContextExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultContextExt<T> for std::result::Result<T, E>
where
    E: Into<CoreError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }
}
