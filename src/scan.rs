//! Content directory scanning.
//!
//! Stage 1 of the curation pipeline. Lists the posts in the content
//! directory and reads their raw text; nothing is parsed yet.
//!
//! ## Directory Structure
//!
//! ```text
//! site/content/
//! ├── 1.md            # Post 1
//! ├── 2.md            # Post 2
//! ├── 10.md           # Post 10 (sorted numerically, after 2)
//! ├── gallery.md      # Our own output, skipped
//! ├── about.md        # Not a post: stem is not a number → rejected
//! └── drafts/         # Subdirectories are not scanned
//! ```
//!
//! ## Naming Conventions
//!
//! - Only `.md` files directly inside the content directory are considered
//!   (extension compared case-insensitively).
//! - The stem must be a plain non-negative integer; it becomes the post's
//!   [`DocumentId`].
//! - Hidden files and the reserved gallery page are skipped silently.
//!
//! ## Failure Isolation
//!
//! Problems with a single file (unreadable, bad name, duplicate number) turn
//! into a [`Rejection`] and the scan carries on. Only a content directory
//! that cannot be listed at all is an error.

use crate::types::{DocumentId, InvalidDocumentId};
use crate::validity::ValidityError;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Content directory not found: {0}")]
    NotADirectory(PathBuf),
    #[error("Cannot list content directory {0}: {1}")]
    Walk(PathBuf, #[source] walkdir::Error),
}

/// Why a file was left out of the corpus.
#[derive(Error, Debug)]
pub enum RejectReason {
    #[error("unreadable: {0}")]
    Unreadable(#[source] io::Error),
    #[error(transparent)]
    InvalidId(#[from] InvalidDocumentId),
    #[error("duplicate identifier {0}, already used by {1}")]
    DuplicateId(DocumentId, PathBuf),
    #[error("invalid date: {0}")]
    InvalidDate(#[from] ValidityError),
}

/// A file excluded from both views, with the reason.
#[derive(Debug)]
pub struct Rejection {
    pub path: PathBuf,
    pub reason: RejectReason,
}

/// A post as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub path: PathBuf,
    pub text: String,
}

/// Everything the scan found.
#[derive(Debug, Default)]
pub struct Corpus {
    /// Readable posts, ascending by identifier.
    pub documents: Vec<SourceDocument>,
    /// Files that looked like posts but could not be used.
    pub rejected: Vec<Rejection>,
}

/// Scan `content_dir` for posts, skipping the file named `reserved`.
pub fn scan(content_dir: &Path, reserved: Option<&OsStr>) -> Result<Corpus, ScanError> {
    if !content_dir.is_dir() {
        return Err(ScanError::NotADirectory(content_dir.to_path_buf()));
    }

    let mut documents: BTreeMap<DocumentId, SourceDocument> = BTreeMap::new();
    let mut rejected = Vec::new();

    for path in collect_candidates(content_dir, reserved, &mut rejected)? {
        match load_document(&path, &documents) {
            Ok(doc) => {
                tracing::debug!(id = %doc.id, path = %path.display(), "loaded document");
                documents.insert(doc.id, doc);
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), error = %reason, "skipping document");
                rejected.push(Rejection { path, reason });
            }
        }
    }

    Ok(Corpus {
        documents: documents.into_values().collect(),
        rejected,
    })
}

/// Markdown files directly inside `content_dir`, in file-name order.
fn collect_candidates(
    content_dir: &Path,
    reserved: Option<&OsStr>,
    rejected: &mut Vec<Rejection>,
) -> Result<Vec<PathBuf>, ScanError> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(content_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(ScanError::Walk(content_dir.to_path_buf(), err));
            }
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                let reason = RejectReason::Unreadable(err.into());
                tracing::warn!(path = %path.display(), error = %reason, "skipping entry");
                rejected.push(Rejection { path, reason });
                continue;
            }
        };

        let path = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') || Some(name) == reserved {
            continue;
        }
        if is_markdown(path) && path.is_file() {
            candidates.push(path.to_path_buf());
        }
    }

    Ok(candidates)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

fn load_document(
    path: &Path,
    seen: &BTreeMap<DocumentId, SourceDocument>,
) -> Result<SourceDocument, RejectReason> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let id: DocumentId = stem.parse()?;

    if let Some(existing) = seen.get(&id) {
        return Err(RejectReason::DuplicateId(id, existing.path.clone()));
    }

    let text = fs::read_to_string(path).map_err(RejectReason::Unreadable)?;
    Ok(SourceDocument {
        id,
        path: path.to_path_buf(),
        text,
    })
}
