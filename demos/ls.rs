//! Example: List a folder
//!
//! Usage:
//!   cargo run --example ls -- --username USER --password PASSWORD [--recursive] [REMOTE_PATH]

mod cli;

use cli::{init_tracing, parse_credentials, usage_and_exit};
use pcloudlib::{FolderRef, ListOptions, Metadata};

const USAGE: &str = "Usage: cargo run --example ls -- --username USER --password PASSWORD [--hostname URL] [--proxy PROXY] [--recursive] [REMOTE_PATH]";

fn print_tree(items: &[Metadata], depth: usize) {
    for item in items {
        let indent = "  ".repeat(depth);
        let name = item.name().unwrap_or("?");
        match item {
            Metadata::Folder(folder) => {
                println!("{}{}/", indent, name);
                if let Some(children) = folder.contents() {
                    print_tree(children, depth + 1);
                }
            }
            Metadata::File(file) => {
                let size = file.attributes.size.unwrap_or_default();
                println!("{}{} ({} bytes)", indent, name, size);
            }
        }
    }
}

#[tokio::main]
async fn main() -> pcloudlib::Result<()> {
    init_tracing();
    let mut creds = parse_credentials(USAGE);
    let recursive = match creds.positionals.iter().position(|a| a == "--recursive" || a == "-r") {
        Some(i) => {
            creds.positionals.remove(i);
            true
        }
        None => false,
    };
    if creds.positionals.len() > 1 {
        usage_and_exit(USAGE);
    }
    let folder = creds
        .positionals
        .first()
        .map(|p| FolderRef::from(p.as_str()))
        .unwrap_or_else(FolderRef::root);

    let session = creds.session()?;
    let options = ListOptions {
        recursive,
        ..ListOptions::default()
    };
    let mut listing = session.list_folder(&folder, options).await?;
    let items = session.folder_contents(&mut listing).await?;
    print_tree(items, 0);

    session.shutdown().await;
    Ok(())
}
