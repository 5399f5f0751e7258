//! Dependency Container (spec §4, §9 Design Notes): the single holder of
//! every capability the orchestrators need, validated at construction.
//! No global singletons — the container is built once and passed
//! explicitly to whichever orchestrator a caller constructs.

use std::path::PathBuf;

use git::GitCapability;
use store::StatusStore;

use crate::{
    config::Config,
    error::{CoreError, Result},
    filesystem::Filesystem,
    hooks::HookRegistry,
    prompt::Prompt,
    repository::RepositoryOrchestrator,
    workspace::WorkspaceOrchestrator,
};

pub struct Container {
    filesystem: Box<dyn Filesystem>,
    config: Box<dyn Config>,
    prompt: Box<dyn Prompt>,
    git: Box<dyn GitCapability>,
    store: StatusStore,
    hooks: HookRegistry,
}

#[derive(Default)]
pub struct ContainerBuilder {
    filesystem: Option<Box<dyn Filesystem>>,
    config: Option<Box<dyn Config>>,
    prompt: Option<Box<dyn Prompt>>,
    git: Option<Box<dyn GitCapability>>,
    store: Option<StatusStore>,
    hooks: Option<HookRegistry>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filesystem(mut self, filesystem: Box<dyn Filesystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    pub fn config(mut self, config: Box<dyn Config>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn prompt(mut self, prompt: Box<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn git(mut self, git: Box<dyn GitCapability>) -> Self {
        self.git = Some(git);
        self
    }

    pub fn store(mut self, store: StatusStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn build(self) -> Result<Container> {
        Ok(Container {
            filesystem: self.filesystem.ok_or(CoreError::IncompleteContainer("filesystem"))?,
            config: self.config.ok_or(CoreError::IncompleteContainer("config"))?,
            prompt: self.prompt.ok_or(CoreError::IncompleteContainer("prompt"))?,
            git: self.git.ok_or(CoreError::IncompleteContainer("git"))?,
            store: self.store.ok_or(CoreError::IncompleteContainer("store"))?,
            hooks: self.hooks.unwrap_or_default(),
        })
    }
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn git(&self) -> &dyn GitCapability {
        self.git.as_ref()
    }

    pub fn config(&self) -> &dyn Config {
        self.config.as_ref()
    }

    pub fn repository(&self, name: &str, current_dir: &std::path::Path) -> Result<RepositoryOrchestrator<'_>> {
        let (repo_id, repo_path) = RepositoryOrchestrator::resolve(name, current_dir, &self.store, self.git.as_ref())?;
        Ok(RepositoryOrchestrator::new(
            repo_id,
            repo_path,
            self.git.as_ref(),
            self.filesystem.as_ref(),
            &self.store,
            self.config.as_ref(),
            self.prompt.as_ref(),
            &self.hooks,
        ))
    }

    pub fn repository_at(&self, repo_id: String, repo_path: PathBuf) -> RepositoryOrchestrator<'_> {
        RepositoryOrchestrator::new(
            repo_id,
            repo_path,
            self.git.as_ref(),
            self.filesystem.as_ref(),
            &self.store,
            self.config.as_ref(),
            self.prompt.as_ref(),
            &self.hooks,
        )
    }

    pub fn workspace(&self, name: String) -> WorkspaceOrchestrator<'_> {
        WorkspaceOrchestrator::new(
            name,
            self.git.as_ref(),
            self.filesystem.as_ref(),
            &self.store,
            self.config.as_ref(),
            self.prompt.as_ref(),
            &self.hooks,
        )
    }
}
