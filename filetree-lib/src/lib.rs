// --- FILE: filetree-lib/src/lib.rs ---

#![doc = include_str!("../README.md")]

// Declare modules
mod config;
mod errors;
mod listing;
mod node;
mod record;
mod stream;
mod transform;
mod tree;
mod utils;

// Public API
pub use config::{EmitTree, ListConfig, StreamOptions, DEFAULT_TREE_NAME};
pub use errors::{TreeError, TreeResult};
pub use listing::list_records;
pub use node::{to_json_pretty, Iter, NodeId, TreeNode};
pub use record::{EmittedNode, FileRecord, FileStat, NodeView, RESERVED_KEYS};
pub use stream::FileTreeStream;
pub use transform::{
    builtin_transform, Basename, BoxedTransform, Focus, TransformOption, TreeTransform,
    BUILTIN_TRANSFORMS,
};
pub use tree::PathTreeBuilder;
