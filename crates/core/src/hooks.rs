//! Hook registration (spec §9 Design Notes): hook plugins themselves are
//! out of scope for the core. All it exposes is a single "run whatever is
//! registered for this phase" call that is a no-op when nothing is
//! registered — the actual hook implementations are an external
//! collaborator's concern.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{CoreError, Result};

type Hook = Arc<dyn Fn(&Path) -> std::result::Result<(), String> + Send + Sync>;

#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: Arc<Mutex<std::collections::HashMap<String, Hook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, phase: impl Into<String>, hook: Hook) {
        self.hooks.lock().unwrap().insert(phase.into(), hook);
    }

    /// Invoke the hook registered for `phase`, if any. Absence is not an
    /// error; a registered hook's own failure is.
    pub fn run(&self, phase: &str, worktree_path: &Path) -> Result<()> {
        let hook = self.hooks.lock().unwrap().get(phase).cloned();
        match hook {
            Some(hook) => hook(worktree_path).map_err(|message| CoreError::HookFailed {
                phase: phase.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}
