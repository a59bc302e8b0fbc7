//! Folder and file metadata, and the ways of addressing them.

use serde::Deserialize;
use serde_json::Value;

use crate::api::Params;
use crate::error::{PCloudError, Result};

/// A remote folder, by id or by absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderRef {
    Id(u64),
    Path(String),
}

/// A remote file, by id or by absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRef {
    Id(u64),
    Path(String),
}

impl FolderRef {
    /// The root folder.
    pub fn root() -> Self {
        FolderRef::Id(0)
    }

    pub(crate) fn params(&self) -> Params {
        match self {
            FolderRef::Id(id) => Params::new().with("folderid", id),
            FolderRef::Path(path) => Params::new().with("path", path),
        }
    }

    /// Parameters addressing a child called `name` inside this folder.
    pub(crate) fn child_params(&self, name: &str) -> Params {
        match self {
            FolderRef::Id(id) => Params::new().with("folderid", id).with("name", name),
            FolderRef::Path(path) => Params::new().with("path", join_path(path, name)),
        }
    }
}

impl FileRef {
    pub(crate) fn params(&self) -> Params {
        match self {
            FileRef::Id(id) => Params::new().with("fileid", id),
            FileRef::Path(path) => Params::new().with("path", path),
        }
    }
}

impl From<u64> for FolderRef {
    fn from(id: u64) -> Self {
        FolderRef::Id(id)
    }
}

impl From<&str> for FolderRef {
    fn from(path: &str) -> Self {
        FolderRef::Path(path.to_string())
    }
}

impl From<u64> for FileRef {
    fn from(id: u64) -> Self {
        FileRef::Id(id)
    }
}

impl From<&str> for FileRef {
    fn from(path: &str) -> Self {
        FileRef::Path(path.to_string())
    }
}

impl std::fmt::Display for FolderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FolderRef::Id(id) => write!(f, "pcloud://folder/{}", id),
            FolderRef::Path(path) => write!(f, "pcloud://{}", path.trim_start_matches('/')),
        }
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileRef::Id(id) => write!(f, "pcloud://file/{}", id),
            FileRef::Path(path) => write!(f, "pcloud://{}", path.trim_start_matches('/')),
        }
    }
}

/// Join a folder path and a child name with exactly one `/`.
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Attributes shared by files and folders.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemAttributes {
    pub name: Option<String>,
    pub path: Option<String>,
    #[serde(rename = "parentfolderid")]
    pub parent_folder_id: Option<u64>,
    pub size: Option<u64>,
    pub category: Option<u32>,
    #[serde(rename = "contenttype")]
    pub content_type: Option<String>,
    pub comments: Option<u64>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub hash: Option<u64>,
    pub icon: Option<String>,
    #[serde(rename = "ismine")]
    pub is_mine: Option<bool>,
    #[serde(rename = "isshared")]
    pub is_shared: Option<bool>,
    #[serde(rename = "thumb")]
    pub has_thumb: Option<bool>,
}

/// A remote file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub id: u64,
    pub attributes: ItemAttributes,
}

/// A remote folder and, once listed, its children.
#[derive(Debug, Clone)]
pub struct FolderInfo {
    pub id: u64,
    pub attributes: ItemAttributes,
    pub(crate) contents: Option<Vec<Metadata>>,
}

impl FolderInfo {
    /// Children, if they were part of the listing that produced this folder.
    ///
    /// Use [`Session::folder_contents`](crate::Session::folder_contents) to fetch them on demand.
    pub fn contents(&self) -> Option<&[Metadata]> {
        self.contents.as_deref()
    }

    pub fn reference(&self) -> FolderRef {
        FolderRef::Id(self.id)
    }
}

impl FileInfo {
    pub fn reference(&self) -> FileRef {
        FileRef::Id(self.id)
    }
}

/// Metadata of a remote item.
#[derive(Debug, Clone)]
pub enum Metadata {
    File(FileInfo),
    Folder(FolderInfo),
}

impl Metadata {
    /// Build from a `metadata` object; the kind is chosen by `fileid` / `folderid`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(PCloudError::InvalidResponse(
                "metadata is not an object".to_string(),
            ));
        };

        let contents = map.remove("contents");
        let folder_id = map.get("folderid").and_then(Value::as_u64);
        let file_id = map.get("fileid").and_then(Value::as_u64);
        let attributes: ItemAttributes = serde_json::from_value(Value::Object(map))?;

        if let Some(id) = folder_id {
            let contents = match contents {
                Some(Value::Array(items)) => Some(
                    items
                        .into_iter()
                        .map(Metadata::from_value)
                        .collect::<Result<Vec<_>>>()?,
                ),
                _ => None,
            };
            return Ok(Metadata::Folder(FolderInfo {
                id,
                attributes,
                contents,
            }));
        }
        if let Some(id) = file_id {
            return Ok(Metadata::File(FileInfo { id, attributes }));
        }
        Err(PCloudError::InvalidResponse(
            "metadata has neither 'fileid' nor 'folderid'".to_string(),
        ))
    }

    pub fn id(&self) -> u64 {
        match self {
            Metadata::File(f) => f.id,
            Metadata::Folder(f) => f.id,
        }
    }

    pub fn attributes(&self) -> &ItemAttributes {
        match self {
            Metadata::File(f) => &f.attributes,
            Metadata::Folder(f) => &f.attributes,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes().name.as_deref()
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Metadata::Folder(_))
    }

    pub fn into_file(self) -> Result<FileInfo> {
        match self {
            Metadata::File(f) => Ok(f),
            Metadata::Folder(f) => Err(PCloudError::InvalidResponse(format!(
                "expected a file, got folder {}",
                f.id
            ))),
        }
    }

    pub fn into_folder(self) -> Result<FolderInfo> {
        match self {
            Metadata::Folder(f) => Ok(f),
            Metadata::File(f) => Err(PCloudError::InvalidResponse(format!(
                "expected a folder, got file {}",
                f.id
            ))),
        }
    }
}
