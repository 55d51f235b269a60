// --- FILE: filetree-lib/src/tree.rs ---

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::errors::{TreeError, TreeResult};
use crate::node::{NodeId, TreeNode};
use crate::record::{decode_node, EmittedNode, FileRecord};
use crate::transform::TreeTransform;
use crate::utils::{filesystem_root, normalize_path, parent_path};

/// Arena slot. The parent pointer lives here, outside the payload, so
/// projections never carry it.
#[derive(Debug, Clone)]
struct Slot {
    record: FileRecord,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Arena {
    slots: Vec<Slot>,
    index: HashMap<PathBuf, NodeId>,
}

impl Arena {
    fn rooted_at(root: PathBuf) -> Self {
        debug!("Creating tree rooted at {:?}", root);
        let record = FileRecord::new(root.clone(), root.clone(), root.clone());
        let mut index = HashMap::new();
        index.insert(root, NodeId::ROOT);
        Self {
            slots: vec![Slot {
                record,
                parent: None,
                children: Vec::new(),
            }],
            index,
        }
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.get()]
    }

    fn insert(&mut self, record: FileRecord) -> TreeResult<Option<NodeId>> {
        if let Some(&existing) = self.index.get(&record.path) {
            trace!("Updating existing node {} for {:?}", existing, record.path);
            self.slots[existing.get()].record = record;
            return Ok(None);
        }

        let parent_dir = parent_path(&record.path);
        if parent_dir == record.path {
            // A filesystem root that is not ours; it can never be attached.
            return Err(TreeError::UnrelatedRoot {
                path: record.path,
                root: self.slot(NodeId::ROOT).record.path.clone(),
            });
        }

        let parent = match self.index.get(&parent_dir) {
            Some(&id) => id,
            None => {
                debug!("Synthesizing directory node for {:?}", parent_dir);
                let synthetic =
                    FileRecord::new(record.cwd.clone(), record.base.clone(), parent_dir.clone());
                self.insert(synthetic)?;
                *self
                    .index
                    .get(&parent_dir)
                    .ok_or_else(|| TreeError::MissingNode(parent_dir.clone()))?
            }
        };

        let id = NodeId::new(self.slots.len());
        trace!("Attaching {:?} as {} under {}", record.path, id, parent);
        self.index.insert(record.path.clone(), id);
        self.slots.push(Slot {
            record,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent.get()].children.push(id);
        Ok(Some(id))
    }

    /// First node, walking down from the root, that has zero or several children.
    fn significant_root(&self) -> NodeId {
        let mut current = NodeId::ROOT;
        while let [only] = self.slot(current).children.as_slice() {
            current = *only;
        }
        current
    }

    fn clone_subtree(&self, id: NodeId) -> TreeNode<FileRecord> {
        let slot = self.slot(id);
        TreeNode::with_children(
            slot.record.payload(),
            slot.children
                .iter()
                .map(|&child| self.clone_subtree(child))
                .collect(),
        )
    }
}

/// Builds a tree of [`FileRecord`]s keyed by path.
///
/// The tree is created on first insertion, anchored at the filesystem root
/// of the first inserted path. Missing ancestor directories are synthesized
/// on the way down, and children keep their insertion order.
///
/// `C` is the context type handed to the transform by [`get_tree`](Self::get_tree).
pub struct PathTreeBuilder<C: ?Sized = FileRecord> {
    arena: Option<Arena>,
    transform: Option<Box<dyn TreeTransform<C>>>,
}

impl PathTreeBuilder {
    /// A builder with no transform.
    pub fn new() -> Self {
        Self {
            arena: None,
            transform: None,
        }
    }
}

impl Default for PathTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> PathTreeBuilder<C> {
    /// A builder that runs `transform` over every compacted tree it hands out.
    pub fn with_transform<F>(transform: F) -> Self
    where
        F: Fn(TreeNode<FileRecord>, Option<&C>) -> TreeResult<TreeNode<FileRecord>> + 'static,
    {
        Self::with_boxed_transform(Some(Box::new(transform)))
    }

    pub fn with_boxed_transform(transform: Option<Box<dyn TreeTransform<C>>>) -> Self {
        Self {
            arena: None,
            transform,
        }
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// Inserts `record` into the tree.
    ///
    /// Returns the id of the newly attached node, or `None` when a node with
    /// the same path already existed and only its payload was replaced.
    ///
    /// # Errors
    ///
    /// * [`TreeError::RelativePath`] if the record's path is empty or relative.
    /// * [`TreeError::UnrelatedRoot`] if the path lives under another filesystem root.
    pub fn add_file_to_tree(&mut self, record: FileRecord) -> TreeResult<Option<NodeId>> {
        let record = record.into_tree_payload()?;
        let arena = self
            .arena
            .get_or_insert_with(|| Arena::rooted_at(filesystem_root(&record.path)));
        arena.insert(record)
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_none()
    }

    /// Number of nodes, synthesized ones and the root included.
    pub fn node_count(&self) -> usize {
        self.arena.as_ref().map_or(0, |arena| arena.slots.len())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.arena.as_ref().map(|_| NodeId::ROOT)
    }

    /// Exact path lookup. The path is normalized first.
    pub fn find(&self, path: &Path) -> Option<NodeId> {
        let arena = self.arena.as_ref()?;
        arena.index.get(&normalize_path(path)).copied()
    }

    pub fn record(&self, id: NodeId) -> Option<&FileRecord> {
        let arena = self.arena.as_ref()?;
        arena.slots.get(id.get()).map(|slot| &slot.record)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let arena = self.arena.as_ref()?;
        arena.slots.get(id.get()).and_then(|slot| slot.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .as_ref()
            .and_then(|arena| arena.slots.get(id.get()))
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    /// Ids from `id` up to the root, `id` first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.record(id).map(|_| id);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }
        chain
    }

    /// Returns an independent copy of the compacted tree, passed through the
    /// transform if one was supplied. `None` if nothing was inserted yet.
    ///
    /// Compaction starts at the root and descends while the current node has
    /// exactly one child, so only the first branching node (or the single
    /// leaf) and what lies below it are returned.
    ///
    /// Fields a transform adds to `extra` under a name in
    /// [`RESERVED_KEYS`](crate::RESERVED_KEYS) are dropped again.
    ///
    /// # Errors
    ///
    /// Whatever the transform returns is propagated unchanged.
    pub fn get_tree(&self, context: Option<&C>) -> TreeResult<Option<TreeNode<FileRecord>>> {
        let Some(arena) = self.arena.as_ref() else {
            return Ok(None);
        };
        let fragment = arena.clone_subtree(arena.significant_root());
        let Some(transform) = &self.transform else {
            return Ok(Some(fragment));
        };
        let mut tree = transform.apply(fragment, context)?;
        tree.traverse_mut(&mut FileRecord::strip_reserved_keys);
        Ok(Some(tree))
    }

    /// The compacted tree with every payload decoded to a plain serializable
    /// record. Nodes with stat metadata become [`NodeView`](crate::NodeView)s;
    /// all others are emitted as the record itself.
    pub fn get_non_circular_tree(&self) -> TreeResult<Option<TreeNode<EmittedNode>>> {
        Ok(self
            .get_tree(None)?
            .map(|tree| tree.map(&mut decode_node)))
    }
}

impl<C: ?Sized> fmt::Debug for PathTreeBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathTreeBuilder")
            .field("nodes", &self.node_count())
            .field("has_transform", &self.has_transform())
            .finish()
    }
}
