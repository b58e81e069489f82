//! Local file existence checks.

use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

/// Answers whether a file is present on local disk.
///
/// Called on every routing decision; implementations must not cache.
pub trait LocalFiles: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;
}

/// Checks the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFiles;

impl LocalFiles for DiskFiles {
    fn exists(&self, path: &Path) -> bool {
        match path.try_exists() {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Existence check failed, treating as absent");
                false
            }
        }
    }
}

/// Map a request path onto the public directory.
///
/// Returns `None` for paths that try to climb out with `..`.
pub fn public_path(root: &Path, pathname: &str) -> Option<PathBuf> {
    let relative = Path::new(pathname.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_path_joins_under_root() {
        let root = Path::new("/srv/public");
        assert_eq!(
            public_path(root, "/static/js/app.js"),
            Some(PathBuf::from("/srv/public/static/js/app.js"))
        );
        assert_eq!(public_path(root, "/"), Some(PathBuf::from("/srv/public")));
        assert_eq!(
            public_path(root, "/./favicon.ico"),
            Some(PathBuf::from("/srv/public/favicon.ico"))
        );
    }

    #[test]
    fn test_public_path_rejects_traversal() {
        assert_eq!(public_path(Path::new("/srv/public"), "/../etc/passwd"), None);
    }

    #[test]
    fn test_disk_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<html></html>").unwrap();

        assert!(DiskFiles.exists(&file));
        assert!(!DiskFiles.exists(&dir.path().join("missing.js")));
    }

    #[cfg(unix)]
    #[test]
    fn test_disk_files_error_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, "hello").unwrap();

        // A regular file used as a directory: ENOTDIR.
        let below_file = file.join("x");
        assert!(below_file.try_exists().is_err());
        assert!(!DiskFiles.exists(&below_file));
    }
}
