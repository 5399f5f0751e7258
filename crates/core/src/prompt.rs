//! Prompt Capability (spec §6.4): three methods only. The core never
//! reads raw stdin; it delegates all user interaction to whatever
//! implements this trait (an interactive CLI layer, out of scope here).

use std::path::{Path, PathBuf};

pub trait Prompt: Send + Sync {
    fn ask_string(&self, prompt: &str, default: Option<&str>) -> String;
    fn ask_path(&self, prompt: &str, default: Option<&Path>) -> PathBuf;
    fn confirm(&self, prompt: &str, default: bool) -> bool;
}

/// Always answers with the supplied default, never prompting. Used when
/// an operation runs in a non-interactive context and the caller has
/// already decided defaults are acceptable (distinct from `force`, which
/// skips confirmation entirely).
#[derive(Debug, Clone, Default)]
pub struct AutoAnswerPrompt;

impl Prompt for AutoAnswerPrompt {
    fn ask_string(&self, _prompt: &str, default: Option<&str>) -> String {
        default.unwrap_or_default().to_string()
    }
    fn ask_path(&self, _prompt: &str, default: Option<&Path>) -> PathBuf {
        default.map(Path::to_path_buf).unwrap_or_default()
    }
    fn confirm(&self, _prompt: &str, default: bool) -> bool {
        default
    }
}

/// Record-and-replay fake: returns pre-scripted answers in call order,
/// panicking if more calls are made than were scripted.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    confirms: std::sync::Mutex<Vec<bool>>,
}

impl ScriptedPrompt {
    pub fn with_confirms(confirms: Vec<bool>) -> Self {
        Self {
            confirms: std::sync::Mutex::new(confirms.into_iter().rev().collect()),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask_string(&self, _prompt: &str, default: Option<&str>) -> String {
        default.unwrap_or_default().to_string()
    }
    fn ask_path(&self, _prompt: &str, default: Option<&Path>) -> PathBuf {
        default.map(Path::to_path_buf).unwrap_or_default()
    }
    fn confirm(&self, prompt: &str, _default: bool) -> bool {
        self.confirms
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| panic!("ScriptedPrompt ran out of scripted answers for: {prompt}"))
    }
}
