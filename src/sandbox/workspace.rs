//! Scratch workspace shared by every run of one worker process

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Host directory bind-mounted into each sandbox
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create the directory if needed and resolve it to an absolute path
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| {
            Error::Config(format!("Failed to create workspace {}: {}", root.display(), e))
        })?;
        let root = root.canonicalize()?;
        debug!(workspace = %root.display(), "Workspace ready");
        Ok(Workspace { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `contents` to `filename`, replacing any previous file.
    ///
    /// The returned guard deletes the file when dropped.
    pub async fn write(&self, filename: &str, contents: &str) -> Result<ScratchFile> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(Error::Internal(format!("Invalid scratch filename: {}", filename)));
        }
        let path = self.root.join(filename);
        tokio::fs::write(&path, contents).await?;
        Ok(ScratchFile { path })
    }
}

/// A source file that is removed on every exit path
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file"),
        }
    }
}
