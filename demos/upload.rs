//! Example: Upload a file with resume support
//!
//! Usage:
//!   cargo run --example upload -- --username USER --password PASSWORD <LOCAL_PATH> <REMOTE_FOLDER> [NAME]
//!
//! To test resume:
//! 1. Start uploading a large file
//! 2. Cancel it mid-way (Ctrl+C)
//! 3. Run the same command again - it will resume from where it left off
//!
//! Note: A `.prog` file is created next to the source file to track progress.

mod cli;

use std::path::Path;

use cli::{init_tracing, parse_credentials, progress_bar, usage_and_exit};
use futures::TryStreamExt;
use pcloudlib::{FileRef, FolderRef, HashAlgorithm, ProgressMarker, UploadTarget, local_checksum};

const USAGE: &str = "Usage: cargo run --example upload -- --username USER --password PASSWORD [--hostname URL] [--proxy PROXY] <LOCAL_PATH> <REMOTE_FOLDER> [NAME]";

#[tokio::main]
async fn main() -> pcloudlib::Result<()> {
    init_tracing();
    let creds = parse_credentials(USAGE);
    if !(2..=3).contains(&creds.positionals.len()) {
        usage_and_exit(USAGE);
    }
    let local_path = Path::new(&creds.positionals[0]);
    let folder = FolderRef::from(creds.positionals[1].as_str());
    let name = match creds.positionals.get(2) {
        Some(name) => name.clone(),
        None => local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| usage_and_exit(USAGE)),
    };

    let file_size = tokio::fs::metadata(local_path).await?.len();
    if ProgressMarker::for_data(local_path).exists().await? {
        println!("Found progress marker - will resume...");
    }

    let session = creds.session()?;
    let target = UploadTarget::new_file(folder.clone(), name.clone());
    let bar = progress_bar(file_size, name.clone());

    let mut steps = Box::pin(session.upload(local_path, target).await?.into_stream());
    while let Some(offset) = steps.try_next().await? {
        bar.set_position(offset);
    }
    bar.finish_with_message(format!("{} complete", name));

    // Files addressed by folder id have no path to verify against.
    if let FolderRef::Path(path) = &folder {
        let remote = FileRef::Path(format!("{}/{}", path.trim_end_matches('/'), name));
        let checksum = local_checksum(local_path, HashAlgorithm::Sha1).await?;
        if session.check(&remote, &checksum, None, true).await? {
            println!("Checksum verified: {}", checksum);
        }
    }

    session.shutdown().await;
    Ok(())
}
