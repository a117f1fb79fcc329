// src/export/sink.rs

use crate::errors::AppResult;
use crate::export::fs_utils::{unique_path, write_atomically};
use std::path::PathBuf;
use tracing::debug;

/// Bytes of a downloaded artifact.
///
/// Owned by exactly one export; the buffer is released when the handle
/// drops, whether or not the bytes were persisted.
pub struct ArtifactHandle {
    bytes: Vec<u8>,
    file_name: String,
}

impl ArtifactHandle {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        debug!(file = %self.file_name, bytes = self.bytes.len(), "artifact released");
    }
}

/// Where finished artifacts end up.
pub trait ArtifactSink: Send + Sync {
    /// Persist the artifact and return the path it was saved to.
    fn persist(&self, artifact: &ArtifactHandle) -> AppResult<PathBuf>;
}

/// Saves artifacts into a directory.
///
/// Existing files are kept: the new one gets a ` (n)` suffix unless the
/// sink was built with `overwrite`.
pub struct FileSink {
    dir: PathBuf,
    overwrite: bool,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }

    fn target(&self, name: &str) -> PathBuf {
        if self.overwrite {
            self.dir.join(name)
        } else {
            unique_path(&self.dir, name)
        }
    }
}

impl ArtifactSink for FileSink {
    fn persist(&self, artifact: &ArtifactHandle) -> AppResult<PathBuf> {
        let path = self.target(artifact.file_name());
        write_atomically(&path, artifact.bytes())?;
        debug!(path = %path.display(), bytes = artifact.len(), "artifact saved");
        Ok(path)
    }
}
