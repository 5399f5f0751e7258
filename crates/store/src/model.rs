//! The registry data model (spec §3, §6.1). Serialized as a single
//! human-readable TOML document; `BTreeMap` gives deterministic,
//! lexically-ordered keys on every save, matching the spec's "any
//! externally observable list MUST be sorted by a stable key" rule.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registry {
    #[serde(default)]
    pub repositories: BTreeMap<String, Repository>,
    #[serde(default)]
    pub workspaces: BTreeMap<String, Workspace>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub path: PathBuf,
    #[serde(default)]
    pub remotes: BTreeMap<String, RemoteInfo>,
    #[serde(default)]
    pub worktrees: BTreeMap<String, WorktreeInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteInfo {
    pub default_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub branch: String,
    pub remote: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<IssueInfo>,
}

/// Opaque issue-tracker reference. The core never interprets this beyond
/// storing and returning it; issue-tracker lookups are an external
/// collaborator (out of scope, spec §1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueInfo {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    /// Ordered list of repository identifiers.
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Branch names, each denoting a cross-repo worktree group.
    #[serde(default)]
    pub worktrees: Vec<String>,
}
