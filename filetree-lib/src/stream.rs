// --- FILE: filetree-lib/src/stream.rs ---

use log::{debug, info};

use crate::config::StreamOptions;
use crate::errors::TreeResult;
use crate::node::to_json_pretty;
use crate::record::FileRecord;
use crate::tree::PathTreeBuilder;

/// Pipeline stage that feeds records into a [`PathTreeBuilder`] and, once the
/// input ends, emits the tree artifact and/or the annotated records.
///
/// One stream owns one builder for exactly one run; `finish` consumes both.
#[derive(Debug)]
pub struct FileTreeStream {
    builder: PathTreeBuilder,
    artifact_name: Option<String>,
    emit_files: bool,
    files: Vec<FileRecord>,
}

impl FileTreeStream {
    /// Creates a stream, resolving the transform option up front.
    ///
    /// # Errors
    ///
    /// * [`TreeError::InvalidTransform`](crate::TreeError::InvalidTransform) if
    ///   the transform option is not something that can be called.
    /// * [`TreeError::UnknownTransform`](crate::TreeError::UnknownTransform) if it
    ///   names a transform that does not exist.
    pub fn new(options: StreamOptions) -> TreeResult<Self> {
        let transform = options.transform.map(|t| t.resolve()).transpose()?;
        let artifact_name = options.emit_tree.artifact_name().map(str::to_string);
        debug!(
            "Stream configured: artifact={:?}, emit_files={}, transform={}",
            artifact_name,
            options.emit_files,
            transform.is_some()
        );
        Ok(Self {
            builder: PathTreeBuilder::with_boxed_transform(transform),
            artifact_name,
            emit_files: options.emit_files,
            files: Vec::new(),
        })
    }

    /// Convenience wrapper: pushes every record, then finishes.
    pub fn run<I>(options: StreamOptions, records: I) -> TreeResult<Vec<FileRecord>>
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let mut stream = Self::new(options)?;
        for record in records {
            stream.push(record)?;
        }
        stream.finish()
    }

    /// Inserts one record. The tree is fully updated when this returns.
    ///
    /// Re-emitted records keep the normalized path they were stored under, so
    /// they always match their node in the attached tree.
    pub fn push(&mut self, record: FileRecord) -> TreeResult<()> {
        if self.emit_files {
            let record = record.into_tree_payload()?;
            self.builder.add_file_to_tree(record.clone())?;
            self.files.push(record);
        } else {
            self.builder.add_file_to_tree(record)?;
        }
        Ok(())
    }

    pub fn builder(&self) -> &PathTreeBuilder {
        &self.builder
    }

    /// Ends the input and returns everything the stage emits, in order:
    /// first the re-emitted records (if enabled), then the tree artifact
    /// (if enabled).
    pub fn finish(self) -> TreeResult<Vec<FileRecord>> {
        let mut output = Vec::new();

        if self.emit_files {
            info!("Re-emitting {} files with attached trees", self.files.len());
            for mut file in self.files {
                file.tree = self.builder.get_tree(Some(&file))?.map(Box::new);
                output.push(file);
            }
        }

        if let Some(name) = &self.artifact_name {
            let tree = self.builder.get_non_circular_tree()?;
            if tree.is_none() {
                info!("No files received; emitting an empty tree");
            }
            let json = to_json_pretty(&tree)?;
            let mut artifact = FileRecord::new("", "", format!("{}.json", name));
            artifact.contents = Some(json.into_bytes());
            debug!("Emitting tree artifact {:?}", artifact.path);
            output.push(artifact);
        }

        Ok(output)
    }
}
