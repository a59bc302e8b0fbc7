//! Filesystem operations split into focused modules.

mod browse;
mod checksum;
mod download;
mod upload;

pub use browse::ListOptions;
pub use checksum::{Checksums, HashAlgorithm, local_checksum};
pub use upload::{UploadOptions, UploadTarget};
