// --- FILE: filetree-lib/src/errors.rs ---

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during `filetree` library operations.
///
/// These cover configuration mistakes detected before any record is
/// processed, malformed input records, listing failures, and internal
/// tree inconsistencies.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The `transform` option was set to something that cannot be called,
    /// such as a number or a table. Raised when the stream is constructed.
    #[error("'transform' option must be of type 'function' (found {found})")]
    InvalidTransform { found: String },

    /// The `transform` option named a transform that is not registered.
    #[error("Unknown transform '{0}'")]
    UnknownTransform(String),

    /// A record was pushed whose path is empty or not absolute.
    #[error("File path must be absolute: {0:?}")]
    RelativePath(PathBuf),

    /// A record lives under a different filesystem root than the one the
    /// tree was anchored at on first insertion.
    #[error("Path {path:?} does not share the tree root {root:?}")]
    UnrelatedRoot { path: PathBuf, root: PathBuf },

    /// A node that must exist at this point could not be found.
    /// Either an internal invariant broke or a transform was handed
    /// a context that is not part of the tree.
    #[error("No tree node found for path {0:?}")]
    MissingNode(PathBuf),

    /// A user-supplied transform failed.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// The `target_path` given to the lister was not found or was inaccessible.
    #[error("Target path not found or not accessible: {0}")]
    TargetPathNotFound(PathBuf),

    /// An I/O error occurred while accessing a path.
    #[error("IO error accessing path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to build the glob pattern matcher from the exclude patterns.
    #[error("Failed to build glob pattern matcher: {0}")]
    GlobMatcherBuildError(#[source] ignore::Error),

    /// The projected tree could not be serialized.
    #[error("Failed to serialize tree: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A convenience type alias for `Result<T, TreeError>`.
pub type TreeResult<T> = Result<T, TreeError>;
