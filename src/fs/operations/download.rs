//! Resumable downloads.

use std::path::Path;

use tracing::{info, warn};

use super::upload::check_resume_size;
use crate::error::Result;
use crate::fs::node::FileRef;
use crate::fs::{OpenFlags, RemoteFile};
use crate::session::Session;
use crate::transfer::{LocalFile, ProgressMarker, Transfer, TransferCursor};

impl Session {
    /// Download a remote file to `local`, resuming an earlier interrupted run
    /// when a progress marker (`<local>.prog`) is present.
    ///
    /// Without a marker `local` must not exist yet. With one, `local` is cut back
    /// to the checkpoint and appended to. The local side is opened before any
    /// request is sent.
    ///
    /// # Example
    /// ```no_run
    /// # use std::path::Path;
    /// # use pcloudlib::{FileRef, Session};
    /// # async fn example(session: &Session) -> pcloudlib::Result<()> {
    /// let file = FileRef::from("/Backups/disk.img");
    /// let size = session.download(Path::new("disk.img"), &file).await?.run().await?;
    /// println!("{} bytes", size);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download(
        &self,
        local: &Path,
        file: &FileRef,
    ) -> Result<Transfer<RemoteFile, LocalFile>> {
        let marker = ProgressMarker::for_data(local);
        let resume = marker.load().await?;
        info!("Download {} to {}", file, local.display());

        let sink = match resume {
            Some(offset) => LocalFile::open_append_at(local, offset).await?,
            None => LocalFile::create_new(local).await?,
        };
        let source = match self.open_remote_source(file, resume, marker.path()).await {
            Ok(source) => source,
            Err(e) => {
                if resume.is_none() {
                    drop(sink);
                    discard_empty(local).await;
                }
                return Err(e);
            }
        };

        let offset = resume.unwrap_or(0);
        if resume.is_some() {
            info!("resuming download at offset {}", offset);
        }
        let cursor = TransferCursor::new(source, sink, offset, self.config.block_size);
        Ok(Transfer::new(cursor, marker))
    }

    /// Open the remote file, checking it still covers a resume offset.
    async fn open_remote_source(
        &self,
        file: &FileRef,
        resume: Option<u64>,
        marker: &Path,
    ) -> Result<RemoteFile> {
        let mut source = self.open_file(file, OpenFlags::NONE).await?;
        if let Some(offset) = resume {
            let checked = match source.size().await {
                Ok(size) => check_resume_size(size, offset, marker),
                Err(e) => Err(e),
            };
            if let Err(e) = checked {
                source.close_quietly().await;
                return Err(e);
            }
        }
        Ok(source)
    }
}

/// Remove a local file created for a download that never started.
async fn discard_empty(local: &Path) {
    if let Err(e) = tokio::fs::remove_file(local).await {
        warn!("Could not remove {}: {}", local.display(), e);
    }
}
