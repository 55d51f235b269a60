// --- FILE: filetree-lib/src/record.rs ---

use std::fs::FileType;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{TreeError, TreeResult};
use crate::node::TreeNode;
use crate::utils::normalize_path;

/// Keys a serialized tree node already writes. `FileRecord::extra` never
/// holds these once the record is part of a tree.
pub const RESERVED_KEYS: [&str; 5] = ["cwd", "base", "path", "stat", "children"];

/// File-system metadata carried by a record.
///
/// Synthesized directory nodes have no stat at all; records coming from a
/// directory walk carry one describing the entry they were created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub is_file: bool,
    pub is_directory: bool,
}

impl FileStat {
    pub const fn file() -> Self {
        Self {
            is_file: true,
            is_directory: false,
        }
    }

    pub const fn directory() -> Self {
        Self {
            is_file: false,
            is_directory: true,
        }
    }
}

impl From<FileType> for FileStat {
    fn from(file_type: FileType) -> Self {
        Self {
            is_file: file_type.is_file(),
            is_directory: file_type.is_dir(),
        }
    }
}

/// A single path-bearing record flowing through the pipeline.
///
/// `path` is the identity of the record inside the tree. `cwd` and `base`
/// are only context for display and relative-path computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub cwd: PathBuf,
    pub base: PathBuf,
    pub path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<FileStat>,

    /// Raw contents. Only set on emitted artifacts; never part of a tree.
    #[serde(skip)]
    pub contents: Option<Vec<u8>>,

    /// The compacted tree attached to this record when files are re-emitted.
    #[serde(skip)]
    pub tree: Option<Box<TreeNode<FileRecord>>>,

    /// Any other fields, e.g. annotations added by a transform.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileRecord {
    pub fn new(
        cwd: impl Into<PathBuf>,
        base: impl Into<PathBuf>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cwd: cwd.into(),
            base: base.into(),
            path: path.into(),
            stat: None,
            contents: None,
            tree: None,
            extra: Map::new(),
        }
    }

    pub fn with_stat(mut self, stat: FileStat) -> Self {
        self.stat = Some(stat);
        self
    }

    /// Path relative to `base`; empty when `path` is not under `base`.
    pub fn relative(&self) -> PathBuf {
        self.path
            .strip_prefix(&self.base)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Final path segment, or an empty string for a filesystem root.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Prepares the record for insertion: the path must be absolute and is
    /// normalized, contents and any attached tree are dropped, and `extra`
    /// loses keys that would collide with serialized fields.
    pub(crate) fn into_tree_payload(mut self) -> TreeResult<Self> {
        if !self.path.is_absolute() {
            return Err(TreeError::RelativePath(self.path));
        }
        self.path = normalize_path(&self.path);
        self.contents = None;
        self.tree = None;
        self.strip_reserved_keys();
        Ok(self)
    }

    pub(crate) fn strip_reserved_keys(&mut self) {
        for key in RESERVED_KEYS {
            if self.extra.remove(key).is_some() {
                warn!("Dropping reserved field {:?} from {:?}", key, self.path);
            }
        }
    }

    /// Copy of the record without contents or an attached tree, as stored in
    /// the tree itself.
    pub(crate) fn payload(&self) -> Self {
        Self {
            cwd: self.cwd.clone(),
            base: self.base.clone(),
            path: self.path.clone(),
            stat: self.stat,
            contents: None,
            tree: None,
            extra: self.extra.clone(),
        }
    }
}

/// Plain view of a node that carries file-system metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub cwd: PathBuf,
    pub base: PathBuf,
    pub path: PathBuf,
    pub relative: PathBuf,
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
}

/// Payload of a node in the non-circular projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EmittedNode {
    /// Node with stat metadata, decoded to a [`NodeView`].
    View(NodeView),
    /// Directory or stat-less node, emitted as the record itself.
    Record(FileRecord),
}

impl EmittedNode {
    pub fn path(&self) -> &Path {
        match self {
            EmittedNode::View(view) => &view.path,
            EmittedNode::Record(record) => &record.path,
        }
    }
}

/// Maps a tree payload to its serializable form.
pub(crate) fn decode_node(record: FileRecord) -> EmittedNode {
    match record.stat {
        Some(stat) => EmittedNode::View(NodeView {
            relative: record.relative(),
            name: record.name(),
            is_file: stat.is_file,
            is_directory: stat.is_directory,
            cwd: record.cwd,
            base: record.base,
            path: record.path,
        }),
        None => EmittedNode::Record(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn relative_and_name_follow_base() {
        let record = FileRecord::new("/work", "/work/src", "/work/src/lib/mod.rs");
        assert_eq!(record.relative(), PathBuf::from("lib/mod.rs"));
        assert_eq!(record.name(), "mod.rs");

        let outside = FileRecord::new("/work", "/other", "/work/a.rs");
        assert_eq!(outside.relative(), PathBuf::new());
        assert_eq!(FileRecord::new("/", "/", "/").name(), "");
    }

    #[test]
    fn decode_node_with_stat_yields_view() -> Result<()> {
        let record = FileRecord::new("/p", "/p", "/p/dir/file.js").with_stat(FileStat::file());
        let value = serde_json::to_value(decode_node(record))?;

        assert_eq!(value["path"], "/p/dir/file.js");
        assert_eq!(value["relative"], "dir/file.js");
        assert_eq!(value["name"], "file.js");
        assert_eq!(value["isFile"], true);
        assert_eq!(value["isDirectory"], false);
        Ok(())
    }

    #[test]
    fn decode_node_without_stat_keeps_record() -> Result<()> {
        let mut record = FileRecord::new("/p", "/p", "/p/dir");
        record
            .extra
            .insert("label".to_string(), Value::String("docs".to_string()));
        let emitted = decode_node(record.clone());
        assert_eq!(emitted, EmittedNode::Record(record));

        let value = serde_json::to_value(&emitted)?;
        assert_eq!(value["path"], "/p/dir");
        assert_eq!(value["label"], "docs");
        assert!(value.get("stat").is_none());
        assert!(value.get("isFile").is_none());
        Ok(())
    }

    #[test]
    fn tree_payload_drops_reserved_extra_fields() -> Result<()> {
        let mut record = FileRecord::new("/p", "/p", "/p/x/../a.js");
        for key in RESERVED_KEYS {
            record.extra.insert(key.to_string(), Value::from("clash"));
        }
        record
            .extra
            .insert("label".to_string(), Value::from("kept"));
        record.contents = Some(b"body".to_vec());

        let payload = record.into_tree_payload()?;
        assert_eq!(payload.path, PathBuf::from("/p/a.js"));
        assert!(payload.contents.is_none());
        assert_eq!(payload.extra.len(), 1);
        assert_eq!(payload.extra["label"], "kept");
        Ok(())
    }
}
