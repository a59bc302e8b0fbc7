//! Block-level capabilities shared by local files and remote descriptors.

use std::future::Future;
use std::io::SeekFrom;
use std::path::Path;

use bytes::Bytes;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::warn;

use crate::error::{PCloudError, Result};
use crate::fs::{RemoteFile, SeekOrigin};

/// One side of a transfer.
pub trait Endpoint: Send {
    /// Best-effort teardown, run once on every exit path. Never fails.
    fn release(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Something blocks can be read from.
pub trait BlockSource: Endpoint {
    /// Position the source so the next block starts at `offset`.
    fn seek(&mut self, offset: u64) -> impl Future<Output = Result<()>> + Send;

    /// Read up to `max_len` bytes. An empty block means end of data.
    fn read_block(&mut self, max_len: usize) -> impl Future<Output = Result<Bytes>> + Send;
}

/// Something blocks can be written to.
pub trait BlockSink: Endpoint {
    /// Write a block, returning how many of its bytes were accepted.
    fn write_block(&mut self, block: Bytes) -> impl Future<Output = Result<u64>> + Send;
}

/// A local file used as either side of a transfer.
#[derive(Debug)]
pub struct LocalFile {
    file: File,
}

impl LocalFile {
    /// Open an existing file for reading.
    pub async fn open_read(path: &Path) -> Result<Self> {
        Ok(Self {
            file: File::open(path).await?,
        })
    }

    /// Create a new file for writing, failing if it already exists.
    pub async fn create_new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        Ok(Self { file })
    }

    /// Open an existing file for appending, cut back to `offset` bytes.
    ///
    /// Bytes past `offset` were written after the last checkpoint and are dropped.
    /// A file shorter than `offset` cannot be resumed.
    pub async fn open_append_at(path: &Path, offset: u64) -> Result<Self> {
        let file = OpenOptions::new().append(true).open(path).await?;
        let len = file.metadata().await?.len();
        if len < offset {
            return Err(PCloudError::InvalidProgress {
                path: path.to_path_buf(),
                reason: format!("resume offset {} is past local size {}", offset, len),
            });
        }
        if len > offset {
            file.set_len(offset).await?;
        }
        Ok(Self { file })
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl Endpoint for LocalFile {
    async fn release(&mut self) {
        if let Err(e) = self.file.flush().await {
            warn!("Could not flush local file: {}", e);
        }
    }
}

impl BlockSource for LocalFile {
    async fn seek(&mut self, offset: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    async fn read_block(&mut self, max_len: usize) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(max_len);
        (&mut self.file).take(max_len as u64).read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

impl BlockSink for LocalFile {
    async fn write_block(&mut self, block: Bytes) -> Result<u64> {
        self.file.write_all(&block).await?;
        self.file.flush().await?;
        Ok(block.len() as u64)
    }
}

impl Endpoint for RemoteFile {
    async fn release(&mut self) {
        self.close_quietly().await;
    }
}

impl BlockSource for RemoteFile {
    async fn seek(&mut self, offset: u64) -> Result<()> {
        RemoteFile::seek(self, offset, SeekOrigin::Begin).await?;
        Ok(())
    }

    async fn read_block(&mut self, max_len: usize) -> Result<Bytes> {
        self.read(max_len).await
    }
}

impl BlockSink for RemoteFile {
    async fn write_block(&mut self, block: Bytes) -> Result<u64> {
        self.write(block).await
    }
}
