//! File-backed resource resolution.
//!
//! Every read the loader performs (manifest, base preamble, document bodies)
//! goes through a [`ResourceResolver`]. Paths are always relative to a
//! configured root; absolute paths and `..` segments are rejected so that
//! tool callers cannot read outside the context tree.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Failure to resolve a single resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource does not exist or could not be read as UTF-8 text.
    #[error("{source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The requested path is absolute or climbs out of the root.
    #[error("path escapes the context root")]
    OutsideRoot { path: String },
}

impl ResourceError {
    /// The relative path the caller asked for.
    pub fn path(&self) -> &str {
        match self {
            ResourceError::Unavailable { path, .. } => path,
            ResourceError::OutsideRoot { path } => path,
        }
    }
}

/// Reads text resources by relative path.
///
/// Implementations must be cheap to share across transport sessions; the
/// loader holds one behind an `Arc` for the lifetime of the process.
pub trait ResourceResolver: Send + Sync {
    /// Read the full text of the resource at `relative_path`.
    fn read_resource(&self, relative_path: &str) -> Result<String, ResourceError>;
}

/// Resolver that reads files beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `relative_path` onto the root, refusing anything that would
    /// land outside it.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, ResourceError> {
        let rel = Path::new(relative_path);
        let escapes = rel.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(ResourceError::OutsideRoot {
                path: relative_path.to_string(),
            });
        }
        Ok(self.root.join(rel))
    }
}

impl ResourceResolver for FileResolver {
    fn read_resource(&self, relative_path: &str) -> Result<String, ResourceError> {
        let full = self.resolve(relative_path)?;
        std::fs::read_to_string(&full).map_err(|source| ResourceError::Unavailable {
            path: relative_path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_file_under_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("context")).unwrap();
        std::fs::write(tmp.path().join("context/base.md"), "base text").unwrap();

        let resolver = FileResolver::new(tmp.path());
        let text = resolver.read_resource("context/base.md").unwrap();
        assert_eq!(text, "base text");
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let resolver = FileResolver::new(tmp.path());

        let err = resolver.read_resource("context/nope.md").unwrap_err();
        assert!(matches!(err, ResourceError::Unavailable { .. }));
        assert_eq!(err.path(), "context/nope.md");
    }

    #[test]
    fn test_parent_dir_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let resolver = FileResolver::new(tmp.path().join("inner"));

        let err = resolver.read_resource("../secret.txt").unwrap_err();
        assert!(matches!(err, ResourceError::OutsideRoot { .. }));

        let err = resolver.read_resource("context/../../secret.txt").unwrap_err();
        assert!(matches!(err, ResourceError::OutsideRoot { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_path_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let resolver = FileResolver::new(tmp.path());

        let err = resolver.read_resource("/etc/passwd").unwrap_err();
        assert!(matches!(err, ResourceError::OutsideRoot { .. }));
        assert_eq!(err.to_string(), "path escapes the context root");
    }

    #[test]
    fn test_current_dir_segments_are_allowed() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.md"), "alpha").unwrap();
        let resolver = FileResolver::new(tmp.path());

        assert_eq!(resolver.read_resource("./a.md").unwrap(), "alpha");
    }
}
