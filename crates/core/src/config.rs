//! Configuration Capability (spec §6.5): `{repositoriesDir, workspacesDir,
//! statusFile}` with a safe fallback when unconfigured. The core never
//! reads a configuration file directly; this trait is the seam an
//! external config-file reader plugs into.

use std::path::PathBuf;

pub trait Config: Send + Sync {
    fn repositories_dir(&self) -> PathBuf;
    fn workspaces_dir(&self) -> PathBuf;
    fn status_file(&self) -> PathBuf;
}

#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub repositories_dir: PathBuf,
    pub workspaces_dir: PathBuf,
    pub status_file: PathBuf,
}

impl Config for StaticConfig {
    fn repositories_dir(&self) -> PathBuf {
        self.repositories_dir.clone()
    }
    fn workspaces_dir(&self) -> PathBuf {
        self.workspaces_dir.clone()
    }
    fn status_file(&self) -> PathBuf {
        self.status_file.clone()
    }
}

/// The safe fallback used when nothing external configures these paths:
/// a `cm` directory under the platform's data-local directory, falling
/// back to the current directory if even that cannot be resolved.
pub fn default_config() -> StaticConfig {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        tracing::warn!("could not resolve a platform data directory, falling back to '.'");
        PathBuf::from(".")
    });
    let root = base.join("cm");
    StaticConfig {
        repositories_dir: root.join("repositories"),
        workspaces_dir: root.join("workspaces"),
        status_file: root.join("status.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_nests_everything_under_one_root() {
        let config = default_config();
        assert!(config.repositories_dir().ends_with("repositories"));
        assert!(config.workspaces_dir().ends_with("workspaces"));
        assert!(config.status_file().ends_with("status.toml"));
    }
}
