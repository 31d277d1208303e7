use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::http::mime::content_type_for;

/// Attributes of a file that exists under the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Absolute or base-relative location on disk
    pub path: PathBuf,
    /// Content-Type guessed from the extension
    pub content_type: &'static str,
    /// Modification time reported by the filesystem
    pub last_modified: SystemTime,
    /// Size in bytes at lookup time
    pub size: u64,
}

/// Looks up request targets under a base directory.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_dir: PathBuf,
}

impl Resolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Maps a request target onto a path inside the base directory.
    ///
    /// Returns `None` for targets that would leave the base directory
    /// (`..` segments, drive prefixes).
    pub fn file_path(&self, target: &str) -> Option<PathBuf> {
        let relative = Path::new(target.trim_start_matches('/'));
        let mut path = self.base_dir.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        Some(path)
    }

    /// Returns the attributes of `target`, or `None` if it is not a
    /// regular file under the base directory.
    pub async fn resolve(&self, target: &str) -> Option<FileInfo> {
        let path = self.file_path(target)?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "File lookup failed");
                return None;
            }
        };

        if !metadata.is_file() {
            return None;
        }

        // No modification time means the file cannot be described
        let last_modified = metadata.modified().ok()?;

        Some(FileInfo {
            content_type: content_type_for(&path),
            last_modified,
            size: metadata.len(),
            path,
        })
    }
}
