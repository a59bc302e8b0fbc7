//! Example: Download a file with resume support
//!
//! Usage:
//!   cargo run --example download -- --username USER --password PASSWORD <REMOTE_PATH> <LOCAL_PATH>
//!
//! Interrupt it and run it again to resume from the last checkpoint.

mod cli;

use std::path::Path;

use cli::{init_tracing, parse_credentials, progress_bar, usage_and_exit};
use futures::TryStreamExt;
use pcloudlib::FileRef;

const USAGE: &str = "Usage: cargo run --example download -- --username USER --password PASSWORD [--hostname URL] [--proxy PROXY] <REMOTE_PATH> <LOCAL_PATH>";

#[tokio::main]
async fn main() -> pcloudlib::Result<()> {
    init_tracing();
    let creds = parse_credentials(USAGE);
    if creds.positionals.len() != 2 {
        usage_and_exit(USAGE);
    }
    let file = FileRef::from(creds.positionals[0].as_str());
    let local_path = Path::new(&creds.positionals[1]);

    let session = creds.session()?;
    let info = session.stat_file(&file).await?;
    let size = info.attributes.size.unwrap_or_default();
    let name = info.attributes.name.clone().unwrap_or_else(|| file.to_string());

    let bar = progress_bar(size, name.clone());
    let mut steps = Box::pin(session.download(local_path, &file).await?.into_stream());
    while let Some(offset) = steps.try_next().await? {
        bar.set_position(offset);
    }
    bar.finish_with_message(format!("{} complete", name));

    session.shutdown().await;
    Ok(())
}
