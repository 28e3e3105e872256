//! Temporary PDF files that clean up after themselves.

use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_TITLE_CHARS: usize = 60;

/// Filename for a downloaded book: `/` replaced, at most 60 title chars, `.pdf`.
///
/// `unique` keeps concurrent downloads of the same title apart.
pub fn safe_file_name(title: &str, unique: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_TITLE_CHARS)
        .collect();
    let stem = cleaned.trim();
    let stem = stem
        .strip_suffix(".pdf")
        .or_else(|| stem.strip_suffix(".PDF"))
        .unwrap_or(stem);
    let stem = if stem.is_empty() { "book" } else { stem };
    format!("{stem}-{unique}.pdf")
}

/// A downloaded file under the temp dir. Removed on [`TempPdf::discard`] or drop.
#[derive(Debug)]
pub struct TempPdf {
    path: PathBuf,
    size: u64,
    removed: bool,
}

impl TempPdf {
    pub(crate) fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Name shown to the recipient.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book.pdf".to_string())
    }

    /// Move the file out of the guard, e.g. for `bookhound fetch --out`.
    pub async fn persist(mut self, dest: &Path) -> std::io::Result<()> {
        if tokio::fs::rename(&self.path, dest).await.is_err() {
            tokio::fs::copy(&self.path, dest).await?;
            let _ = tokio::fs::remove_file(&self.path).await;
        }
        self.removed = true;
        Ok(())
    }

    /// Delete the file now.
    pub async fn discard(mut self) {
        remove_quietly(&self.path).await;
        self.removed = true;
    }
}

impl Drop for TempPdf {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %self.path.display(), error = %e, "temp file cleanup failed");
                }
            }
        }
    }
}

pub(crate) async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "temp file cleanup failed");
        }
    }
}
