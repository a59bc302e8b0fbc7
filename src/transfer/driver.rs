//! Checkpointed transfers that survive process restarts.

use futures::Stream;
use tracing::{info, warn};

use super::block::{BlockSink, BlockSource};
use super::cursor::TransferCursor;
use super::marker::ProgressMarker;
use crate::error::Result;

/// A resumable transfer: a [`TransferCursor`] whose progress is mirrored into a
/// [`ProgressMarker`] after every step.
///
/// Each offset is written to the marker before it is handed out, so whenever the
/// caller sees an offset the marker already names it. Stopping early (dropping
/// the transfer) leaves the marker in place for the next run. When the source is
/// exhausted both endpoints are released and the marker is removed. On error the
/// endpoints are released and the marker keeps the last good offset.
///
/// ```no_run
/// # async fn demo(session: &pcloudlib::Session) -> pcloudlib::Result<()> {
/// use std::path::Path;
/// use pcloudlib::{FolderRef, UploadTarget};
///
/// let target = UploadTarget::new_file(FolderRef::from("/Backups"), "disk.img");
/// let mut transfer = session.upload(Path::new("disk.img"), target).await?;
/// while let Some(offset) = transfer.next_step().await? {
///     println!("{} bytes sent", offset);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Transfer<S, D> {
    cursor: TransferCursor<S, D>,
    marker: ProgressMarker,
    done: bool,
}

impl<S: BlockSource, D: BlockSink> Transfer<S, D> {
    pub(crate) fn new(cursor: TransferCursor<S, D>, marker: ProgressMarker) -> Self {
        Self {
            cursor,
            marker,
            done: false,
        }
    }

    /// Bytes transferred so far, counted from the start of the file.
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    pub fn marker(&self) -> &ProgressMarker {
        &self.marker
    }

    /// Move one block and checkpoint it.
    ///
    /// Returns the new offset, or `Ok(None)` once the transfer has completed.
    /// After an error the transfer is finished and also returns `Ok(None)`.
    pub async fn next_step(&mut self) -> Result<Option<u64>> {
        if self.done {
            return Ok(None);
        }
        match self.cursor.next_step().await {
            Ok(Some(offset)) => {
                if let Err(e) = self.marker.store(offset).await {
                    self.abort().await;
                    return Err(e);
                }
                Ok(Some(offset))
            }
            Ok(None) => {
                self.done = true;
                self.cursor.release().await;
                self.marker.remove().await?;
                info!("transfer complete: {} bytes", self.cursor.offset());
                Ok(None)
            }
            Err(e) => {
                warn!(
                    "transfer stopped at {} (resume marker {}): {}",
                    self.cursor.offset(),
                    self.marker.path().display(),
                    e
                );
                self.abort().await;
                Err(e)
            }
        }
    }

    async fn abort(&mut self) {
        self.done = true;
        self.cursor.release().await;
    }

    /// Drive the transfer to completion and return the final offset.
    pub async fn run(mut self) -> Result<u64> {
        while self.next_step().await?.is_some() {}
        Ok(self.offset())
    }

    /// The remaining steps as a stream of offsets.
    pub fn into_stream(self) -> impl Stream<Item = Result<u64>> {
        futures::stream::try_unfold(self, |mut transfer| async move {
            let step = transfer.next_step().await;
            step.map(|offset| offset.map(|offset| (offset, transfer)))
        })
    }
}
