use std::io::Write;
use std::path::{Path, PathBuf};

use docsmith_core::models::render::PdfArtifact;
use tempfile::TempPath;
use tracing::{debug, warn};

/// A preview file on disk. Deleted when the handle is released or dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    generation: u64,
    size_bytes: usize,
    path: TempPath,
}

impl PreviewHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn release(self) {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => debug!(
                path = %path.display(),
                generation = self.generation,
                "preview released"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove preview file"),
        }
    }
}

/// Holds at most one preview file, always the newest render's.
#[derive(Debug, Default)]
pub struct PreviewSlot {
    dir: Option<PathBuf>,
    current: Option<PreviewHandle>,
}

impl PreviewSlot {
    /// Preview files go to the system temp directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    /// Write `artifact` as the new preview, releasing the previous file.
    ///
    /// Returns `Ok(false)` and keeps the current preview when `generation`
    /// is older than the one already shown.
    pub fn present(&mut self, generation: u64, artifact: &PdfArtifact) -> std::io::Result<bool> {
        if let Some(current) = &self.current
            && generation < current.generation
        {
            debug!(generation, shown = current.generation, "refusing older preview");
            return Ok(false);
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("docsmith-preview-").suffix(".pdf");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(artifact.bytes())?;
        file.flush()?;

        let handle = PreviewHandle {
            generation,
            size_bytes: artifact.size_bytes(),
            path: file.into_temp_path(),
        };
        debug!(path = %handle.path().display(), generation, "preview written");

        if let Some(previous) = self.current.replace(handle) {
            previous.release();
        }
        Ok(true)
    }

    /// Release the current preview, if any.
    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.release();
        }
    }

    /// Copy the current preview to `dest`.
    pub fn save_to(&self, dest: &Path) -> std::io::Result<Option<u64>> {
        match &self.current {
            Some(handle) => std::fs::copy(handle.path(), dest).map(Some),
            None => Ok(None),
        }
    }
}
