//! Remote filesystem: metadata, open files, and session-level operations.

pub(crate) mod node;
mod operations;
mod remote_file;

pub use node::{FileInfo, FileRef, FolderInfo, FolderRef, ItemAttributes, Metadata};
pub use operations::{
    Checksums, HashAlgorithm, ListOptions, UploadOptions, UploadTarget, local_checksum,
};
pub use remote_file::{OpenFlags, RemoteFile, SeekOrigin};
