// --- FILE: filetree-lib/src/config.rs ---

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::transform::TransformOption;

/// Artifact name used when `emit_tree` is simply `true`.
pub const DEFAULT_TREE_NAME: &str = "tree";

/// Whether, and under which name, the standalone tree artifact is emitted.
///
/// Deserializes from either a boolean or a string, so configuration files
/// can write `emit_tree = false` as well as `emit_tree = "layout"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmitTree {
    Enabled(bool),
    Named(String),
}

impl Default for EmitTree {
    fn default() -> Self {
        EmitTree::Enabled(true)
    }
}

impl EmitTree {
    /// Base name of the artifact (without `.json`), or `None` when suppressed.
    /// An empty name suppresses emission just like `false`.
    pub fn artifact_name(&self) -> Option<&str> {
        match self {
            EmitTree::Enabled(true) => Some(DEFAULT_TREE_NAME),
            EmitTree::Enabled(false) => None,
            EmitTree::Named(name) if name.is_empty() => None,
            EmitTree::Named(name) => Some(name),
        }
    }
}

/// Options for a [`FileTreeStream`](crate::FileTreeStream).
///
/// The defaults match a plain run: emit `tree.json`, do not re-emit the
/// input records, no transform.
#[derive(Debug, Default)]
pub struct StreamOptions {
    /// Emit the serialized tree as a standalone artifact.
    pub emit_tree: EmitTree,

    /// Re-emit every input record with its compacted tree attached.
    pub emit_files: bool,

    /// Post-processing hook over the compacted tree. Validated when the
    /// stream is constructed.
    pub transform: Option<TransformOption>,
}

/// Configuration for listing records from a directory.
#[derive(Debug, Clone)]
pub struct ListConfig {
    /// The directory to walk. It will be canonicalized internally.
    pub target_path: PathBuf,

    /// Glob patterns (.gitignore syntax) of files or directories to skip.
    pub exclude_patterns: Vec<String>,

    /// If true, only regular files become records; directories are left to
    /// parent synthesis and carry no stat.
    pub files_only: bool,
}
