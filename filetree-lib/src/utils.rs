// --- FILE: filetree-lib/src/utils.rs ---

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};

/// Lexically normalizes a path: drops `.` segments and resolves `..`
/// against the preceding segment. Never touches the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(
                    normalized.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    normalized.pop();
                }
            }
        }
    }
    normalized
}

/// Returns the parent directory of `path`. A filesystem root is its own parent.
pub(crate) fn parent_path(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => filesystem_root(path),
    }
}

/// Returns the filesystem root (`/`, `C:\`) that `path` lives under.
pub(crate) fn filesystem_root(path: &Path) -> PathBuf {
    let root: PathBuf = path
        .components()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect();
    if root.as_os_str().is_empty() {
        PathBuf::from(MAIN_SEPARATOR_STR)
    } else {
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_cur_dir_and_resolves_parent_dir() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(parent_path(Path::new("/")), PathBuf::from("/"));
        assert_eq!(parent_path(Path::new("/a")), PathBuf::from("/"));
        assert_eq!(parent_path(Path::new("/a/b")), PathBuf::from("/a"));
    }

    #[test]
    fn filesystem_root_of_nested_path() {
        assert_eq!(filesystem_root(Path::new("/a/b/c")), PathBuf::from("/"));
    }
}
