//! Archive storage for raw fetched documents
//!
//! Layout: `root/<category>/<file_name>`, where `root` defaults to `origin`
//! and `category` is a site or book label. Derived output under `parsed/`
//! belongs to extraction collaborators, not this module.

use crate::PaperwormError;
use std::path::{Path, PathBuf};

/// Converts a URL into a deterministic, filesystem-safe file name
///
/// Transform: `://` becomes `_`, characters outside `[A-Za-z0-9_.-]` become
/// `_`, runs of `_` collapse to one, leading/trailing `_` are trimmed, and an
/// empty result falls back to `default`. The extension is always `.html`.
///
/// # Example
///
/// ```
/// use paperworm::archive::archive_filename;
///
/// assert_eq!(
///     archive_filename("https://example.com/path?query=1"),
///     "https_example.com_path_query_1.html"
/// );
/// ```
pub fn archive_filename(url: &str) -> String {
    let stripped = url.replace("://", "_");

    let mut name = String::with_capacity(stripped.len());
    let mut last_was_underscore = false;
    for ch in stripped.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
            ch
        } else {
            '_'
        };

        if mapped == '_' {
            if !last_was_underscore {
                name.push('_');
            }
            last_was_underscore = true;
        } else {
            name.push(mapped);
            last_was_underscore = false;
        }
    }

    let name = name.trim_matches('_');
    if name.is_empty() {
        "default.html".to_string()
    } else {
        format!("{}.html", name)
    }
}

/// Filesystem store for raw document text
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
    default_category: String,
}

impl ArchiveStore {
    /// Creates a store rooted at `root` with a default category bucket
    pub fn new(root: impl AsRef<Path>, default_category: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            default_category: default_category.into(),
        }
    }

    /// The archive root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Computes the destination path for a document without writing it
    pub fn path_for(&self, category: Option<&str>, file_name: &str) -> PathBuf {
        let category = category.unwrap_or(&self.default_category);
        self.root.join(category).join(file_name)
    }

    /// Writes decoded document text, creating the directory tree if absent
    ///
    /// Returns the full path of the written file for ledger recording.
    pub fn write(
        &self,
        category: Option<&str>,
        file_name: &str,
        text: &str,
    ) -> crate::Result<PathBuf> {
        let path = self.path_for(category, file_name);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PaperwormError::Archive {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        std::fs::write(&path, text).map_err(|e| PaperwormError::Archive {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(path)
    }
}
