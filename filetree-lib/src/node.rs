// --- FILE: filetree-lib/src/node.rs ---

//! Node identifiers and the owned, parent-free tree type handed out by the builder.

use std::fmt;

use serde::Serialize;

use crate::errors::TreeResult;

/// Index of a node inside the builder's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node always has ID 0
    pub const ROOT: NodeId = NodeId(0);

    pub const fn new(id: usize) -> Self {
        NodeId(id)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// An owned tree with forward references only.
///
/// Serializes as the payload's fields flattened next to a `children` array,
/// so a `TreeNode<FileRecord>` becomes `{ "cwd": .., "path": .., "children": [..] }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub data: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn with_children(data: T, children: Vec<TreeNode<T>>) -> Self {
        Self { data, children }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order iterator over this subtree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { stack: vec![self] }
    }

    /// First node in pre-order whose payload matches `predicate`.
    pub fn find<P>(&self, predicate: P) -> Option<&TreeNode<T>>
    where
        P: Fn(&T) -> bool,
    {
        self.iter().find(|node| predicate(&node.data))
    }

    /// Consumes the tree and returns the first subtree in pre-order whose
    /// payload matches `predicate`.
    pub fn into_subtree<P>(self, predicate: P) -> Option<TreeNode<T>>
    where
        P: Fn(&T) -> bool,
    {
        let mut stack = vec![self];
        while let Some(mut node) = stack.pop() {
            if predicate(&node.data) {
                return Some(node);
            }
            let children = std::mem::take(&mut node.children);
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Visits every payload in pre-order with mutable access.
    pub fn traverse_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut T),
    {
        f(&mut self.data);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Rebuilds the tree with every payload mapped through `f`, keeping shape
    /// and child order.
    pub fn map<U, F>(self, f: &mut F) -> TreeNode<U>
    where
        F: FnMut(T) -> U,
    {
        let data = f(self.data);
        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children {
            children.push(child.map(f));
        }
        TreeNode { data, children }
    }
}

/// Pre-order iterator returned by [`TreeNode::iter`].
pub struct Iter<'a, T> {
    stack: Vec<&'a TreeNode<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a TreeNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Renders any serializable value as tab-indented JSON.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> TreeResult<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
