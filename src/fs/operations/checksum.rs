//! Remote checksums and integrity checks.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{PCloudError, Result};
use crate::fs::node::FileRef;
use crate::session::Session;

/// Attempts made by [`Session::check`] while the server reports "File not found".
const CHECK_ATTEMPTS: u32 = 6;
const CHECK_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Hash algorithms the server reports, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha1,
    Md5,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha1,
        HashAlgorithm::Md5,
    ];

    /// Field name used by `checksumfile`.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Md5 => "md5",
        }
    }

    /// Length of the hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Md5 => 32,
        }
    }

    /// Guess the algorithm from the length of a hex digest.
    pub fn from_checksum_len(checksum: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.hex_len() == checksum.len())
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checksums of a remote file. The server sends only the ones its region supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Checksums {
    pub sha256: Option<String>,
    pub sha1: Option<String>,
    pub md5: Option<String>,
}

impl Checksums {
    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&str> {
        match algorithm {
            HashAlgorithm::Sha256 => self.sha256.as_deref(),
            HashAlgorithm::Sha1 => self.sha1.as_deref(),
            HashAlgorithm::Md5 => self.md5.as_deref(),
        }
    }

    /// Strongest checksum available.
    pub fn best(&self) -> Option<(HashAlgorithm, &str)> {
        HashAlgorithm::ALL
            .into_iter()
            .find_map(|algo| self.get(algo).map(|sum| (algo, sum)))
    }

    /// Checksum for `algorithm`, or the strongest one when it is missing.
    fn get_or_best(&self, algorithm: HashAlgorithm) -> Option<&str> {
        match self.get(algorithm) {
            Some(sum) => Some(sum),
            None => {
                warn!("Could not find {} checksum. Using best checksum", algorithm);
                self.best().map(|(_, sum)| sum)
            }
        }
    }
}

impl Session {
    /// Checksums of a remote file.
    pub async fn checksum_file(&self, file: &FileRef) -> Result<Checksums> {
        self.api
            .request(Method::GET, "checksumfile", file.params())
            .await?
            .into_typed()
    }

    /// Compare the checksum of a remote file with `expected`.
    ///
    /// Without `algorithm` the algorithm is picked from the length of `expected`.
    /// With `retry`, "File not found" is retried a few times, 5 seconds apart:
    /// right after an upload the server may not have indexed the file yet.
    pub async fn check(
        &self,
        file: &FileRef,
        expected: &str,
        algorithm: Option<HashAlgorithm>,
        retry: bool,
    ) -> Result<bool> {
        let algorithm = match algorithm {
            Some(algorithm) => algorithm,
            None => HashAlgorithm::from_checksum_len(expected)
                .ok_or_else(|| PCloudError::InvalidChecksum(expected.to_string()))?,
        };

        let mut attempts = 0;
        let checksums = loop {
            attempts += 1;
            match self.checksum_file(file).await {
                Ok(checksums) => break checksums,
                Err(e) if retry && e.is_not_found() && attempts < CHECK_ATTEMPTS => {
                    debug!(%file, attempts, "checksum not ready, retrying");
                    sleep(CHECK_RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        };

        Ok(compare(&checksums, algorithm, expected))
    }
}

fn compare(checksums: &Checksums, algorithm: HashAlgorithm, expected: &str) -> bool {
    let actual = checksums.get_or_best(algorithm).unwrap_or_default();
    if actual != expected {
        warn!(
            "Checksum mismatch: local file checksum {}, remote file checksum {}",
            expected, actual
        );
        return false;
    }
    true
}

/// Hex digest of a local file.
///
/// Only SHA-256 and SHA-1 are computed locally.
pub async fn local_checksum(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    match algorithm {
        HashAlgorithm::Sha256 => hash_file::<Sha256>(path).await,
        HashAlgorithm::Sha1 => hash_file::<Sha1>(path).await,
        HashAlgorithm::Md5 => Err(PCloudError::InvalidChecksum(format!(
            "{} is not computed locally",
            algorithm
        ))),
    }
}

async fn hash_file<D: Digest>(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
