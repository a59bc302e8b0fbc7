//! # pcloudlib
//!
//! Rust client library for pCloud storage.
//!
//! ## Features
//!
//! - **Authentication**: lazy digest login on first use, cached auth token, logout.
//! - **Folders and files**: list (optionally recursive), create folders, stat files,
//!   open and create remote files and work on them through [`RemoteFile`].
//! - **Resumable transfers**: upload and download in fixed-size blocks. After every
//!   block the offset is written to a `<local path>.prog` marker, so an interrupted
//!   transfer continues where it stopped on the next run.
//! - **Integrity**: remote checksums and verification against a local digest.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use futures::TryStreamExt;
//! use pcloudlib::{FileRef, FolderRef, ListOptions, Session, UploadTarget};
//!
//! # async fn example() -> pcloudlib::Result<()> {
//! let session = Session::login("user@example.com", "password").await?;
//!
//! let root = session.list_folder(&FolderRef::root(), ListOptions::default()).await?;
//! for item in root.contents().unwrap_or_default() {
//!     println!("{}", item.name().unwrap_or("?"));
//! }
//!
//! // Upload; progress is reported block by block.
//! let target = UploadTarget::new_file(FolderRef::from("/"), "notes.txt");
//! let mut steps = Box::pin(session.upload(Path::new("notes.txt"), target).await?.into_stream());
//! while let Some(offset) = steps.try_next().await? {
//!     println!("{} bytes uploaded", offset);
//! }
//!
//! // Download to a local file.
//! let file = FileRef::from("/notes.txt");
//! session.download(Path::new("notes-copy.txt"), &file).await?.run().await?;
//!
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod session;
pub mod transfer;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{PCloudError, Result};
pub use fs::{
    Checksums, FileInfo, FileRef, FolderInfo, FolderRef, HashAlgorithm, ItemAttributes,
    ListOptions, Metadata, OpenFlags, RemoteFile, SeekOrigin, UploadOptions, UploadTarget,
    local_checksum,
};
pub use session::{ServerInfo, Session, UserInfo};
pub use transfer::{LocalFile, ProgressMarker, Transfer};
