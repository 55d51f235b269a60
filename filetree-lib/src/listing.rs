// --- FILE: filetree-lib/src/listing.rs ---

use std::env;
use std::io;
use std::path::PathBuf;

use ignore::gitignore::GitignoreBuilder;
use ignore::Match;
use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::ListConfig;
use crate::errors::{TreeError, TreeResult};
use crate::record::{FileRecord, FileStat};

/// Walks `config.target_path` and turns every entry below it into a
/// [`FileRecord`], in a stable (file-name sorted, depth-first) order.
///
/// The target itself is not listed; parent synthesis recreates it. `.git/`
/// is always skipped, as is anything matching `exclude_patterns`.
///
/// # Errors
///
/// * [`TreeError::TargetPathNotFound`] if the target does not exist.
/// * [`TreeError::IoError`] if the target or the working directory cannot be resolved.
/// * [`TreeError::GlobMatcherBuildError`] if the exclude patterns cannot be compiled.
///
/// Errors on individual entries are logged and the entry is skipped.
pub fn list_records(config: &ListConfig) -> TreeResult<Vec<FileRecord>> {
    let target_path = config.target_path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            TreeError::TargetPathNotFound(config.target_path.clone())
        } else {
            TreeError::IoError {
                path: config.target_path.clone(),
                source: e,
            }
        }
    })?;
    let cwd = env::current_dir().map_err(|e| TreeError::IoError {
        path: PathBuf::from("current working directory"),
        source: e,
    })?;
    debug!("Listing records using walkdir starting at: {:?}", target_path);

    let mut exclude_builder = GitignoreBuilder::new(&target_path);
    // Always exclude the .git directory
    if let Err(e) = exclude_builder.add_line(None, ".git/") {
        warn!(
            "Failed to add default exclusion pattern '.git/': {}. Git directory might be included.",
            e
        );
    }
    for pattern in &config.exclude_patterns {
        if let Err(e) = exclude_builder.add_line(None, pattern) {
            error!(
                "Failed to add exclude pattern '{}': {}. This pattern will be ignored.",
                pattern, e
            );
        }
    }
    let exclude_matcher = exclude_builder
        .build()
        .map_err(TreeError::GlobMatcherBuildError)?;

    let mut records = Vec::new();
    for entry_result in WalkDir::new(&target_path).min_depth(1).sort_by_file_name() {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                let path_display = e.path().map_or_else(
                    || target_path.display().to_string(),
                    |p| p.display().to_string(),
                );
                warn!(
                    "Skipping path due to error during walk near {}: {}",
                    path_display, e
                );
                continue;
            }
        };

        let file_type = entry.file_type();
        if config.files_only && !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        match exclude_matcher.matched_path_or_any_parents(path, file_type.is_dir()) {
            Match::None | Match::Whitelist(_) => {
                records.push(
                    FileRecord::new(&cwd, &target_path, path).with_stat(FileStat::from(file_type)),
                );
            }
            Match::Ignore(_) => {
                debug!("Excluding path due to pattern match: {:?}", path);
            }
        }
    }

    info!("Listed {} records under {:?}", records.len(), target_path);
    Ok(records)
}
