//! Static file resolution under a fixed root directory.
//!
//! Every lookup is canonicalized (dot segments and symlinks resolved) and
//! must stay inside the canonical root. Anything else, including I/O
//! failures, is reported as "not found" so the client learns nothing about
//! the filesystem layout.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::http::mime;
use crate::http::response::{Body, Response, ResponseBuilder, StatusCode};

const INDEX_FILE: &str = "index.html";

/// A file resolved for one request.
#[derive(Debug, Clone)]
pub struct StaticEntry {
    /// Canonical path of the file on disk.
    pub path: PathBuf,
    pub mime: &'static str,
    /// Text for textual MIME types, raw bytes otherwise.
    pub content: Body,
}

impl StaticEntry {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn into_response(self) -> Response {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", mime::content_type(self.mime))
            .body(self.content)
            .build()
    }
}

#[derive(Debug, Clone)]
pub struct StaticResolver {
    root: PathBuf,
}

impl StaticResolver {
    /// Canonicalizes `root` once; it must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root)
            .with_context(|| format!("Static root {} is not accessible", root.display()))?;
        if !canonical.is_dir() {
            anyhow::bail!("Static root {} is not a directory", canonical.display());
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto a file inside the root.
    ///
    /// A directory resolves to its `index.html`.
    pub async fn resolve(&self, request_path: &str) -> Option<StaticEntry> {
        let relative = request_path.trim_start_matches('/');
        let candidate = self.root.join(relative);

        let mut path = self.contain(&candidate).await?;

        let metadata = tokio::fs::metadata(&path).await.ok()?;
        if metadata.is_dir() {
            path = self.contain(&path.join(INDEX_FILE)).await?;
        }

        let metadata = tokio::fs::metadata(&path).await.ok()?;
        if !metadata.is_file() {
            debug!(path = %request_path, "Static path is not a regular file");
            return None;
        }

        let mime = mime::from_path(&path);
        let content = if mime::is_textual(mime) {
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => Body::Text(text),
                Err(e) => {
                    warn!(path = %request_path, error = %e, "Failed to read static text file");
                    return None;
                }
            }
        } else {
            match tokio::fs::read(&path).await {
                Ok(bytes) => Body::Bytes(bytes),
                Err(e) => {
                    warn!(path = %request_path, error = %e, "Failed to read static file");
                    return None;
                }
            }
        };

        Some(StaticEntry { path, mime, content })
    }

    /// Canonicalizes `candidate` and checks it lies inside the root.
    async fn contain(&self, candidate: &Path) -> Option<PathBuf> {
        // Missing files fail here too, which is the common "not found" case.
        let canonical = tokio::fs::canonicalize(candidate).await.ok()?;
        if !canonical.starts_with(&self.root) {
            warn!(
                candidate = %candidate.display(),
                "Rejected static path outside the static root"
            );
            return None;
        }
        Some(canonical)
    }
}
