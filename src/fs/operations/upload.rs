//! Resumable and multipart uploads.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::info;

use crate::api::Params;
use crate::error::{PCloudError, Result};
use crate::fs::node::{FileRef, FolderRef, Metadata, join_path};
use crate::fs::{OpenFlags, RemoteFile, SeekOrigin};
use crate::http::Body;
use crate::session::Session;
use crate::session::{create_flags, open_flags};
use crate::transfer::{LocalFile, ProgressMarker, Transfer, TransferCursor};

/// Where an upload goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// An existing remote file, rewritten from the start.
    File(FileRef),
    /// A new file called `name` in `folder`. The first run fails if it exists.
    NewFile { folder: FolderRef, name: String },
}

impl UploadTarget {
    pub fn file(file: impl Into<FileRef>) -> Self {
        UploadTarget::File(file.into())
    }

    pub fn new_file(folder: impl Into<FolderRef>, name: impl Into<String>) -> Self {
        UploadTarget::NewFile {
            folder: folder.into(),
            name: name.into(),
        }
    }

    /// Parameters addressing the destination as an existing file.
    fn existing_params(&self) -> Params {
        match self {
            UploadTarget::File(file) => file.params(),
            UploadTarget::NewFile { folder, name } => folder.child_params(name),
        }
    }
}

impl From<FileRef> for UploadTarget {
    fn from(file: FileRef) -> Self {
        UploadTarget::File(file)
    }
}

impl fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadTarget::File(file) => write!(f, "{}", file),
            UploadTarget::NewFile {
                folder: FolderRef::Path(path),
                name,
            } => write!(f, "{}", FileRef::Path(join_path(path, name))),
            UploadTarget::NewFile { folder, name } => write!(f, "{}/{}", folder, name),
        }
    }
}

/// How to open the remote side of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenPlan {
    params: Params,
    flags: OpenFlags,
    offset: u64,
    resume: bool,
}

impl OpenPlan {
    fn new(target: &UploadTarget, resume: Option<u64>) -> Self {
        match (resume, target) {
            (Some(offset), _) => OpenPlan {
                params: target.existing_params(),
                flags: open_flags(OpenFlags::WRITE),
                offset,
                resume: true,
            },
            (None, UploadTarget::NewFile { folder, name }) => OpenPlan {
                params: folder.child_params(name),
                flags: create_flags(OpenFlags::NONE),
                offset: 0,
                resume: false,
            },
            (None, UploadTarget::File(file)) => OpenPlan {
                params: file.params(),
                flags: open_flags(OpenFlags::TRUNC),
                offset: 0,
                resume: false,
            },
        }
    }
}

/// Options for [`Session::upload_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Hash under which the server tracks the progress of this upload.
    pub progress_hash: Option<String>,
    /// Keep partially uploaded files when the upload is interrupted.
    pub partial: bool,
    /// Replace files with the same name instead of renaming the new ones.
    pub overwrite: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            progress_hash: None,
            partial: true,
            overwrite: false,
        }
    }
}

impl Session {
    /// Upload a local file, resuming an earlier interrupted run when a
    /// progress marker (`<local>.prog`) is present.
    ///
    /// Nothing is transferred until the returned [`Transfer`] is driven. The
    /// marker is removed once the transfer completes.
    pub async fn upload(
        &self,
        local: &Path,
        target: UploadTarget,
    ) -> Result<Transfer<LocalFile, RemoteFile>> {
        let marker = ProgressMarker::for_data(local);
        let plan = OpenPlan::new(&target, marker.load().await?);
        info!("Upload {} to {}", local.display(), target);

        let source = LocalFile::open_read(local).await?;
        let mut sink = RemoteFile::open(&self.api, plan.params, plan.flags).await?;
        if plan.resume {
            info!("resuming upload at offset {}", plan.offset);
            if let Err(e) = reconcile_remote(&sink, plan.offset, marker.path()).await {
                sink.close_quietly().await;
                return Err(e);
            }
        }

        let cursor = TransferCursor::new(source, sink, plan.offset, self.config.block_size);
        Ok(Transfer::new(cursor, marker))
    }

    /// Upload in-memory files in a single multipart request.
    ///
    /// Returns the metadata of the created files. An empty list sends nothing.
    pub async fn upload_files(
        &self,
        folder: &FolderRef,
        files: Vec<(String, Bytes)>,
        options: &UploadOptions,
    ) -> Result<Vec<Metadata>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = folder.params();
        if let Some(hash) = &options.progress_hash {
            params.set("progresshash", hash);
        }
        params
            .flag("renameifexists", !options.overwrite)
            .flag("nopartial", !options.partial);

        let form = files.into_iter().fold(Form::new(), |form, (name, data)| {
            form.part(name.clone(), Part::bytes(data.to_vec()).file_name(name))
        });

        let mut response = self
            .api
            .send_auth(None, Method::POST, "uploadfile", params, Some(Body::Multipart(form)))
            .await?
            .into_json()?;
        response
            .parse::<Vec<Value>>("metadata")?
            .into_iter()
            .map(Metadata::from_value)
            .collect()
    }
}

/// Make the remote file exactly `offset` bytes long and put its pointer there.
///
/// Bytes past the checkpoint were never acknowledged and are sent again.
async fn reconcile_remote(file: &RemoteFile, offset: u64, marker: &Path) -> Result<()> {
    let size = file.size().await?;
    check_resume_size(size, offset, marker)?;
    if size > offset {
        info!("truncating remote file from {} to {} bytes", size, offset);
        file.truncate(offset).await?;
    }
    file.seek(offset, SeekOrigin::Begin).await?;
    Ok(())
}

pub(crate) fn check_resume_size(size: u64, offset: u64, marker: &Path) -> Result<()> {
    if size < offset {
        return Err(PCloudError::InvalidProgress {
            path: marker.to_path_buf(),
            reason: format!("resume offset {} is past remote size {}", offset, size),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::api::fake::{Call, FakeApi, Reply};

    /// A remote file of `size` bytes that accepts every write in full.
    fn remote_file(size: u64) -> impl Fn(&Call) -> Reply + Send + Sync + 'static {
        move |call| match call.endpoint.as_str() {
            "file_open" => Reply::Json(json!({"fd": 5, "fileid": 42})),
            "file_size" => Reply::Json(json!({"size": size, "offset": size})),
            "file_seek" => Reply::Json(json!({"offset": call.param_u64("offset")})),
            "file_write" => Reply::Json(json!({"bytes": call.body.len()})),
            _ => Reply::Json(json!({})),
        }
    }

    fn written(api: &FakeApi) -> Vec<Vec<u8>> {
        api.find("file_write").into_iter().map(|call| call.body).collect()
    }

    async fn local_with_marker(dir: &Path, offset: Option<u64>) -> std::path::PathBuf {
        let local = dir.join("disk.img");
        std::fs::write(&local, b"hello world!").unwrap();
        if let Some(offset) = offset {
            ProgressMarker::for_data(&local).store(offset).await.unwrap();
        }
        local
    }

    #[test]
    fn test_plan_fresh_new_file_is_exclusive() {
        let target = UploadTarget::new_file(FolderRef::from("/Backups"), "disk.img");
        let plan = OpenPlan::new(&target, None);
        assert_eq!(plan.params.get("path"), Some("/Backups/disk.img"));
        assert!(plan.flags.contains(OpenFlags::CREAT | OpenFlags::EXCL | OpenFlags::WRITE));
        assert_eq!(plan.offset, 0);
        assert!(!plan.resume);
    }

    #[test]
    fn test_plan_fresh_existing_file_truncates() {
        let plan = OpenPlan::new(&UploadTarget::file(42u64), None);
        assert_eq!(plan.params.get("fileid"), Some("42"));
        assert!(plan.flags.contains(OpenFlags::TRUNC | OpenFlags::WRITE));
        assert!(!plan.flags.contains(OpenFlags::CREAT));
        assert!(!plan.resume);
    }

    #[test]
    fn test_plan_resume_reopens_for_append() {
        let target = UploadTarget::new_file(FolderRef::Id(7), "disk.img");
        let plan = OpenPlan::new(&target, Some(1024));
        assert_eq!(plan.params.get("folderid"), Some("7"));
        assert_eq!(plan.params.get("name"), Some("disk.img"));
        assert!(plan.flags.contains(OpenFlags::APPEND | OpenFlags::WRITE));
        assert!(!plan.flags.contains(OpenFlags::CREAT));
        assert_eq!(plan.offset, 1024);
        assert!(plan.resume);

        let plan = OpenPlan::new(&UploadTarget::file("/a.bin"), Some(0));
        assert_eq!(plan.params.get("path"), Some("/a.bin"));
        assert!(plan.resume);
    }

    #[test]
    fn test_resume_size_check() {
        let marker = Path::new("/tmp/a.bin.prog");
        assert!(check_resume_size(8, 8, marker).is_ok());
        assert!(check_resume_size(12, 8, marker).is_ok());
        assert!(matches!(
            check_resume_size(4, 8, marker),
            Err(PCloudError::InvalidProgress { .. })
        ));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(
            UploadTarget::new_file(FolderRef::from("/"), "a.txt").to_string(),
            "pcloud://a.txt"
        );
        assert_eq!(
            UploadTarget::new_file(FolderRef::Id(3), "a.txt").to_string(),
            "pcloud://folder/3/a.txt"
        );
        assert_eq!(UploadTarget::file(9u64).to_string(), "pcloud://file/9");
    }

    #[tokio::test]
    async fn test_upload_files_empty_sends_nothing() {
        let session = Session::new(crate::ClientConfig::default()).unwrap();
        let created = session
            .upload_files(&FolderRef::root(), Vec::new(), &UploadOptions::default())
            .await
            .unwrap();
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn test_upload_missing_local_file_touches_nothing() {
        let dir = tempdir().unwrap();
        let session = Session::new(crate::ClientConfig::default()).unwrap();
        let local = dir.path().join("missing.bin");
        let err = session
            .upload(&local, UploadTarget::new_file(FolderRef::root(), "missing.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, PCloudError::Io(_)));
        assert!(!ProgressMarker::for_data(&local).path().exists());
    }

    #[tokio::test]
    async fn test_fresh_upload_creates_exclusively() {
        let api = FakeApi::start(remote_file(0)).await;
        let dir = tempdir().unwrap();
        let local = local_with_marker(dir.path(), None).await;

        let target = UploadTarget::new_file(FolderRef::from("/Backups"), "disk.img");
        let transfer = api.session(4).upload(&local, target).await.unwrap();
        assert_eq!(transfer.run().await.unwrap(), 12);

        assert_eq!(
            api.endpoints(),
            ["file_open", "file_write", "file_write", "file_write", "file_close"]
        );
        let open = &api.find("file_open")[0];
        assert_eq!(open.param("path"), Some("/Backups/disk.img"));
        assert_eq!(open.param("flags"), Some("194"));
        assert_eq!(written(&api), [b"hell".to_vec(), b"o wo".to_vec(), b"rld!".to_vec()]);
        assert!(!ProgressMarker::for_data(&local).path().exists());
    }

    #[tokio::test]
    async fn test_resume_truncates_remote_then_seeks() {
        let api = FakeApi::start(remote_file(9)).await;
        let dir = tempdir().unwrap();
        let local = local_with_marker(dir.path(), Some(4)).await;

        let target = UploadTarget::new_file(FolderRef::from("/Backups"), "disk.img");
        let transfer = api.session(4).upload(&local, target).await.unwrap();
        assert_eq!(transfer.run().await.unwrap(), 12);

        assert_eq!(
            api.endpoints(),
            [
                "file_open",
                "file_size",
                "file_truncate",
                "file_seek",
                "file_write",
                "file_write",
                "file_close"
            ]
        );
        assert_eq!(api.find("file_open")[0].param("flags"), Some("1026"));
        assert_eq!(api.find("file_truncate")[0].param("length"), Some("4"));
        let seek = &api.find("file_seek")[0];
        assert_eq!((seek.param("offset"), seek.param("whence")), (Some("4"), Some("0")));
        assert_eq!(written(&api), [b"o wo".to_vec(), b"rld!".to_vec()]);
        assert!(!ProgressMarker::for_data(&local).path().exists());
    }

    #[tokio::test]
    async fn test_resume_at_remote_size_only_seeks() {
        let api = FakeApi::start(remote_file(8)).await;
        let dir = tempdir().unwrap();
        let local = local_with_marker(dir.path(), Some(8)).await;

        let transfer = api.session(4).upload(&local, UploadTarget::file(42u64)).await.unwrap();
        assert_eq!(transfer.run().await.unwrap(), 12);

        assert_eq!(
            api.endpoints(),
            ["file_open", "file_size", "file_seek", "file_write", "file_close"]
        );
        assert_eq!(api.find("file_open")[0].param("fileid"), Some("42"));
        assert_eq!(written(&api), [b"rld!".to_vec()]);
    }

    #[tokio::test]
    async fn test_resume_past_remote_size_closes_remote() {
        let api = FakeApi::start(remote_file(2)).await;
        let dir = tempdir().unwrap();
        let local = local_with_marker(dir.path(), Some(4)).await;

        let err = api
            .session(4)
            .upload(&local, UploadTarget::file(42u64))
            .await
            .unwrap_err();
        assert!(matches!(err, PCloudError::InvalidProgress { .. }));
        assert_eq!(api.endpoints(), ["file_open", "file_size", "file_close"]);
        assert_eq!(api.find("file_close")[0].param("fd"), Some("5"));
        assert_eq!(
            ProgressMarker::for_data(&local).load().await.unwrap(),
            Some(4)
        );
    }
}
