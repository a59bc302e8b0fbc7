//! Open file descriptors on the pCloud service.

use std::ops::BitOr;

use bytes::Bytes;
use reqwest::Method;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiErrorCode, Connection, Params};
use crate::error::{PCloudError, Result};
use crate::http::{Body, Payload};

/// Number of attempts made by [`RemoteFile::close_quietly`].
const CLOSE_ATTEMPTS: u32 = 3;

/// Flags for opening and creating remote files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags(u32);

impl OpenFlags {
    pub const NONE: OpenFlags = OpenFlags(0);
    /// Make the file writable.
    pub const WRITE: OpenFlags = OpenFlags(0x0002);
    /// Create the file if it does not exist.
    pub const CREAT: OpenFlags = OpenFlags(0x0040);
    /// With `CREAT`, fail if the file already exists.
    pub const EXCL: OpenFlags = OpenFlags(0x0080);
    /// Erase the contents of an existing file.
    pub const TRUNC: OpenFlags = OpenFlags(0x0200);
    /// Start with the file pointer at the end of the file.
    pub const APPEND: OpenFlags = OpenFlags(0x0400);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: OpenFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlags) -> OpenFlags {
        OpenFlags(self.0 | rhs.0)
    }
}

/// Reference point for [`RemoteFile::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Begin = 0,
    Current = 1,
    End = 2,
}

/// An open descriptor on the pCloud service.
///
/// Every request on the descriptor goes through its own connection, pinned
/// to the server that answered `file_open`. Once
/// closed, any further call fails with [`PCloudError::FileClosed`]. Dropping
/// a handle that is still open schedules a best-effort close.
#[derive(Debug)]
pub struct RemoteFile {
    api: ApiClient,
    conn: Connection,
    fd: u64,
    file_id: u64,
    open: bool,
}

impl RemoteFile {
    /// Send `file_open` on a fresh connection and wrap the returned descriptor.
    pub(crate) async fn open(
        api: &ApiClient,
        mut params: Params,
        flags: OpenFlags,
    ) -> Result<Self> {
        let conn = api.new_connection().await?;
        params.set("flags", flags.bits());
        let response = api
            .send_auth(Some(&conn), Method::GET, "file_open", params, None)
            .await?
            .into_json()?;
        let fd = response.u64("fd")?;
        let file_id = response.u64("fileid")?;
        debug!(fd, file_id, flags = flags.bits(), "opened remote file");
        Ok(Self {
            api: api.clone(),
            conn,
            fd,
            file_id,
            open: true,
        })
    }

    pub fn fd(&self) -> u64 {
        self.fd
    }

    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn params(&self) -> Result<Params> {
        if !self.open {
            return Err(PCloudError::FileClosed(self.fd));
        }
        Ok(Params::new().with("fd", self.fd))
    }

    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        params: Params,
        body: Option<Body>,
    ) -> Result<Payload> {
        self.api
            .send_auth(Some(&self.conn), method, endpoint, params, body)
            .await
    }

    /// Read up to `count` bytes at the file pointer.
    pub async fn read(&self, count: usize) -> Result<Bytes> {
        let params = self.params()?.with("count", count);
        self.call(Method::GET, "file_read", params, None)
            .await?
            .into_binary()
    }

    /// Read up to `count` bytes at `offset`, leaving the file pointer alone.
    pub async fn pread(&self, count: usize, offset: u64) -> Result<Bytes> {
        let params = self.params()?.with("count", count).with("offset", offset);
        self.call(Method::GET, "file_pread", params, None)
            .await?
            .into_binary()
    }

    /// Write at the file pointer. Returns the number of bytes the server accepted.
    pub async fn write(&self, data: Bytes) -> Result<u64> {
        let params = self.params()?;
        let response = self
            .call(Method::PUT, "file_write", params, Some(Body::Raw(data)))
            .await?
            .into_json()?;
        response.u64("bytes")
    }

    /// Write at `offset`, leaving the file pointer alone.
    pub async fn pwrite(&self, data: Bytes, offset: u64) -> Result<u64> {
        let params = self.params()?.with("offset", offset);
        let response = self
            .call(Method::PUT, "file_pwrite", params, Some(Body::Raw(data)))
            .await?
            .into_json()?;
        response.u64("bytes")
    }

    /// Truncate (or extend) the file to `length` bytes.
    pub async fn truncate(&self, length: u64) -> Result<()> {
        let params = self.params()?.with("length", length);
        self.call(Method::GET, "file_truncate", params, None)
            .await?
            .into_json()?;
        Ok(())
    }

    /// Move the file pointer. Returns the new absolute position.
    pub async fn seek(&self, offset: u64, origin: SeekOrigin) -> Result<u64> {
        let params = self
            .params()?
            .with("offset", offset)
            .with("whence", origin as u8);
        self.call(Method::GET, "file_seek", params, None)
            .await?
            .into_json()?
            .u64("offset")
    }

    /// Size of the file in bytes.
    pub async fn size(&self) -> Result<u64> {
        let params = self.params()?;
        self.call(Method::GET, "file_size", params, None)
            .await?
            .into_json()?
            .u64("size")
    }

    /// Current file pointer position.
    pub async fn offset(&self) -> Result<u64> {
        let params = self.params()?;
        self.call(Method::GET, "file_size", params, None)
            .await?
            .into_json()?
            .u64("offset")
    }

    /// Close the descriptor.
    pub async fn close(&mut self) -> Result<()> {
        let params = self.params()?;
        self.call(Method::GET, "file_close", params, None)
            .await?
            .into_json()?;
        self.open = false;
        debug!(fd = self.fd, "closed remote file");
        Ok(())
    }

    /// Close with a bounded number of attempts, never failing.
    ///
    /// A server reply of "invalid or closed descriptor" counts as closed.
    /// When every attempt fails the handle is marked closed and a warning is logged.
    pub async fn close_quietly(&mut self) {
        let mut attempts = 0;
        while self.open {
            attempts += 1;
            match self.close().await {
                Ok(()) => {}
                Err(e) if is_already_closed(&e) => self.open = false,
                Err(e) if attempts >= CLOSE_ATTEMPTS => {
                    warn!("Could not close file {}: {}", self.fd, e);
                    self.open = false;
                }
                Err(e) => debug!(fd = self.fd, attempt = attempts, "close failed: {}", e),
            }
        }
    }
}

fn is_already_closed(e: &PCloudError) -> bool {
    e.api_code() == Some(ApiErrorCode::InvalidDescriptor.code())
}

impl Drop for RemoteFile {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let mut orphan = RemoteFile {
            api: self.api.clone(),
            conn: self.conn.clone(),
            fd: self.fd,
            file_id: self.file_id,
            open: true,
        };
        self.open = false;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { orphan.close_quietly().await });
            }
            Err(_) => {
                orphan.open = false;
                warn!("Could not close file {}: no async runtime", self.fd);
            }
        }
    }
}
