//! Folder listing and metadata lookups.

use reqwest::Method;
use tracing::debug;

use crate::api::Params;
use crate::error::Result;
use crate::fs::node::{FileInfo, FileRef, FolderInfo, FolderRef, Metadata};
use crate::session::Session;

/// Options for [`Session::list_folder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// List the contents of child folders as well.
    pub recursive: bool,
    /// Include deleted items that are still in the trash.
    pub show_deleted: bool,
    /// Leave files out, list folders only.
    pub no_files: bool,
    /// Leave out items shared with the user.
    pub no_shares: bool,
}

impl ListOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Self::default()
        }
    }

    fn apply(&self, params: &mut Params) {
        params
            .flag("recursive", self.recursive)
            .flag("showdeleted", self.show_deleted)
            .flag("nofiles", self.no_files)
            .flag("noshares", self.no_shares);
    }
}

impl Session {
    /// List a folder.
    ///
    /// The returned folder carries its direct children. With
    /// [`ListOptions::recursive`] every descendant folder carries its children too.
    ///
    /// # Example
    /// ```no_run
    /// # use pcloudlib::{FolderRef, ListOptions, Session};
    /// # async fn example(session: &Session) -> pcloudlib::Result<()> {
    /// let root = session.list_folder(&FolderRef::root(), ListOptions::default()).await?;
    /// for item in root.contents().unwrap_or_default() {
    ///     println!("{}", item.name().unwrap_or("?"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_folder(&self, folder: &FolderRef, options: ListOptions) -> Result<FolderInfo> {
        let mut params = folder.params();
        options.apply(&mut params);
        debug!(%folder, ?options, "listfolder");
        self.metadata_request("listfolder", params)
            .await?
            .into_folder()
    }

    /// Children of `folder`, fetched on first use and cached in `folder`.
    pub async fn folder_contents<'a>(&self, folder: &'a mut FolderInfo) -> Result<&'a [Metadata]> {
        if folder.contents.is_none() {
            let listed = self
                .list_folder(&folder.reference(), ListOptions::default())
                .await?;
            folder.contents = Some(listed.contents.unwrap_or_default());
        }
        Ok(folder.contents.as_deref().unwrap_or_default())
    }

    /// Create a folder called `name` in `parent`. Fails if it already exists.
    pub async fn create_folder(&self, parent: &FolderRef, name: &str) -> Result<FolderInfo> {
        self.metadata_request("createfolder", parent.child_params(name))
            .await?
            .into_folder()
    }

    /// Create a folder called `name` in `parent`, or return the existing one.
    pub async fn create_folder_if_not_exists(
        &self,
        parent: &FolderRef,
        name: &str,
    ) -> Result<FolderInfo> {
        self.metadata_request("createfolderifnotexists", parent.child_params(name))
            .await?
            .into_folder()
    }

    /// Metadata of a file.
    pub async fn stat_file(&self, file: &FileRef) -> Result<FileInfo> {
        self.metadata_request("stat", file.params())
            .await?
            .into_file()
    }

    async fn metadata_request(&self, endpoint: &str, params: Params) -> Result<Metadata> {
        let mut response = self.api.request(Method::GET, endpoint, params).await?;
        Metadata::from_value(response.parse("metadata")?)
    }
}
