//! Sidecar progress marker for resumable transfers.
//!
//! The marker lives next to the local file, at the same path with `.prog`
//! appended, and holds the number of bytes already transferred as decimal text.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PCloudError, Result};

/// Suffix appended to the local file path.
pub const MARKER_SUFFIX: &str = ".prog";

/// Progress marker of one local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressMarker {
    path: PathBuf,
}

impl ProgressMarker {
    /// Marker belonging to the local data file at `data_path`.
    pub fn for_data<P: AsRef<Path>>(data_path: P) -> Self {
        let mut path = OsString::from(data_path.as_ref().as_os_str());
        path.push(MARKER_SUFFIX);
        Self {
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a marker is present. Touches nothing remote.
    pub async fn exists(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    /// Read the resume offset, or `None` when there is no marker.
    pub async fn load(&self) -> Result<Option<u64>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let offset = text
            .trim()
            .parse::<u64>()
            .map_err(|e| PCloudError::InvalidProgress {
                path: self.path.clone(),
                reason: format!("{:?} is not a byte offset: {}", text.trim(), e),
            })?;
        Ok(Some(offset))
    }

    /// Overwrite the marker with `offset`.
    pub async fn store(&self, offset: u64) -> Result<()> {
        tokio::fs::write(&self.path, offset.to_string()).await?;
        debug!(marker = %self.path.display(), offset, "checkpoint");
        Ok(())
    }

    /// Delete the marker. A missing marker is not an error.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("remove(\"{}\")", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
