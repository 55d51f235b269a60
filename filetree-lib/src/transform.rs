// --- FILE: filetree-lib/src/transform.rs ---

use std::path::PathBuf;

use log::debug;
use serde_json::Value;

use crate::errors::{TreeError, TreeResult};
use crate::node::TreeNode;
use crate::record::FileRecord;
use crate::utils::parent_path;

/// A post-processing hook over the compacted tree clone.
///
/// `C` is the context passed to [`PathTreeBuilder::get_tree`](crate::PathTreeBuilder::get_tree);
/// the stream adapter passes the record the tree is being attached to.
/// The transform owns the clone and may restructure or annotate it freely.
pub trait TreeTransform<C: ?Sized> {
    fn apply(
        &self,
        tree: TreeNode<FileRecord>,
        context: Option<&C>,
    ) -> TreeResult<TreeNode<FileRecord>>;
}

impl<C: ?Sized, F> TreeTransform<C> for F
where
    F: Fn(TreeNode<FileRecord>, Option<&C>) -> TreeResult<TreeNode<FileRecord>>,
{
    fn apply(
        &self,
        tree: TreeNode<FileRecord>,
        context: Option<&C>,
    ) -> TreeResult<TreeNode<FileRecord>> {
        self(tree, context)
    }
}

pub type BoxedTransform<C = FileRecord> = Box<dyn TreeTransform<C>>;

/// How a transform is selected in [`StreamOptions`](crate::StreamOptions).
pub enum TransformOption {
    /// An injected transform.
    Callable(BoxedTransform),
    /// The name of a built-in transform, see [`builtin_transform`].
    Named(String),
    /// A configuration value that cannot be called.
    Invalid(Value),
}

impl TransformOption {
    /// Classifies a raw configuration value. `null` means no transform.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(name) => Some(TransformOption::Named(name)),
            other => Some(TransformOption::Invalid(other)),
        }
    }

    /// Resolves the option into a callable transform, failing on values that
    /// do not name one.
    pub fn resolve(self) -> TreeResult<BoxedTransform> {
        match self {
            TransformOption::Callable(transform) => Ok(transform),
            TransformOption::Named(name) => builtin_transform(&name),
            TransformOption::Invalid(value) => Err(TreeError::InvalidTransform {
                found: value_kind(&value).to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for TransformOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformOption::Callable(_) => f.write_str("Callable(..)"),
            TransformOption::Named(name) => f.debug_tuple("Named").field(name).finish(),
            TransformOption::Invalid(value) => f.debug_tuple("Invalid").field(value).finish(),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Names accepted by [`builtin_transform`].
pub const BUILTIN_TRANSFORMS: &[&str] = &["basename", "focus"];

/// Looks up a built-in transform by name.
pub fn builtin_transform(name: &str) -> TreeResult<BoxedTransform> {
    debug!("Resolving built-in transform '{}'", name);
    match name {
        "basename" => Ok(Box::new(Basename)),
        "focus" => Ok(Box::new(Focus)),
        other => Err(TreeError::UnknownTransform(other.to_string())),
    }
}

/// Replaces every node's path with its final segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Basename;

impl<C: ?Sized> TreeTransform<C> for Basename {
    fn apply(
        &self,
        mut tree: TreeNode<FileRecord>,
        _context: Option<&C>,
    ) -> TreeResult<TreeNode<FileRecord>> {
        tree.traverse_mut(&mut |record: &mut FileRecord| {
            record.path = PathBuf::from(record.name());
        });
        Ok(tree)
    }
}

/// Narrows the tree to the directory holding the context record.
///
/// Without a context the tree is returned unchanged. If the context's parent
/// directory was compacted away, the tree is also returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Focus;

impl TreeTransform<FileRecord> for Focus {
    fn apply(
        &self,
        tree: TreeNode<FileRecord>,
        context: Option<&FileRecord>,
    ) -> TreeResult<TreeNode<FileRecord>> {
        let Some(file) = context else {
            return Ok(tree);
        };
        if tree.find(|record| record.path == file.path).is_none() {
            return Err(TreeError::MissingNode(file.path.clone()));
        }
        let parent = parent_path(&file.path);
        if tree.find(|record| record.path == parent).is_none() {
            return Ok(tree);
        }
        tree.into_subtree(|record| record.path == parent)
            .ok_or(TreeError::MissingNode(parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(path: &str) -> FileRecord {
        FileRecord::new("/", "/", path)
    }

    fn sample() -> TreeNode<FileRecord> {
        TreeNode::with_children(
            record("/p"),
            vec![
                TreeNode::with_children(record("/p/a"), vec![TreeNode::new(record("/p/a/x.html"))]),
                TreeNode::new(record("/p/b.css")),
            ],
        )
    }

    #[test]
    fn from_value_classifies_config_values() {
        assert!(TransformOption::from_value(Value::Null).is_none());
        assert!(matches!(
            TransformOption::from_value(json!("basename")),
            Some(TransformOption::Named(ref n)) if n == "basename"
        ));
        assert!(matches!(
            TransformOption::from_value(json!(1245)),
            Some(TransformOption::Invalid(_))
        ));
    }

    #[test]
    fn non_callable_values_are_type_errors() {
        for value in [json!(1245), json!({}), json!(true), json!(["basename"])] {
            let option = TransformOption::Invalid(value);
            match option.resolve() {
                Err(TreeError::InvalidTransform { .. }) => {}
                other => panic!("expected InvalidTransform, got {:?}", other.err()),
            }
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        match builtin_transform("reverse") {
            Err(TreeError::UnknownTransform(name)) => assert_eq!(name, "reverse"),
            other => panic!("expected UnknownTransform, got {:?}", other.err()),
        }
    }

    #[test]
    fn basename_rewrites_every_path() -> TreeResult<()> {
        let tree = TreeTransform::<FileRecord>::apply(&Basename, sample(), None)?;
        let names: Vec<_> = tree.iter().map(|n| n.data.path.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("p"),
                PathBuf::from("a"),
                PathBuf::from("x.html"),
                PathBuf::from("b.css")
            ]
        );
        Ok(())
    }

    #[test]
    fn focus_returns_parent_directory_of_context() -> TreeResult<()> {
        let context = record("/p/a/x.html");
        let tree = Focus.apply(sample(), Some(&context))?;
        assert_eq!(tree.data.path, PathBuf::from("/p/a"));
        assert_eq!(tree.children.len(), 1);

        let unchanged = Focus.apply(sample(), None)?;
        assert_eq!(unchanged, sample());
        Ok(())
    }

    #[test]
    fn focus_with_unknown_context_fails() {
        let context = record("/elsewhere/z.txt");
        assert!(matches!(
            Focus.apply(sample(), Some(&context)),
            Err(TreeError::MissingNode(_))
        ));
    }
}
