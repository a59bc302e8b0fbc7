//! pCloud API result codes.

/// pCloud API result codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Log in required
    LoginRequired,
    /// No full path or name/folderid provided
    NoPathOrName,
    /// No full path or folderid provided
    NoPathOrFolderId,
    /// No fileid or path provided
    NoFileIdOrPath,
    /// Please provide flags
    NoFlags,
    /// Invalid or closed file descriptor
    InvalidDescriptor,
    /// Please provide 'offset'
    NoOffset,
    /// Please provide 'length'
    NoLength,
    /// Please provide 'count'
    NoCount,
    /// No full topath or toname/tofolderid provided
    NoTarget,
    /// Invalid 'folderid' provided
    InvalidFolderId,
    /// Please provide language
    NoLanguage,
    /// Language not supported
    LanguageNotSupported,
    /// Please provide at least one of 'topath', 'tofolderid' or 'toname'
    NoDestination,
    /// Log in failed
    LoginFailed,
    /// Invalid file/folder name
    InvalidName,
    /// A component of parent directory does not exist
    ParentMissing,
    /// Access denied
    AccessDenied,
    /// File or folder already exists
    AlreadyExists,
    /// Directory does not exist
    DirectoryMissing,
    /// Folder is not empty
    FolderNotEmpty,
    /// Cannot delete the root folder
    DeleteRoot,
    /// User is over quota
    OverQuota,
    /// File not found
    FileNotFound,
    /// Invalid path
    InvalidPath,
    /// Shared folder inside shared folder
    NestedShare,
    /// Active shares or share requests on folder
    ActiveShares,
    /// Connection broken
    ConnectionBroken,
    /// Cannot rename the root folder
    RenameRoot,
    /// Cannot move a folder to a subfolder of itself
    MoveIntoSelf,
    /// Cannot create non-encrypted file in encrypted folder
    PlainInCrypto,
    /// Cannot copy folder into itself
    CopyIntoSelf,
    /// Cannot copy folder to subfolder of itself
    CopyIntoSubfolder,
    /// Target folder does not exist
    TargetMissing,
    /// Too many login tries from this IP address
    TooManyLogins,
    /// Internal error
    Internal,
    /// Internal upload error
    InternalUpload,
    /// Write error
    WriteError,
    /// Read error
    ReadError,
    /// Unknown error
    Unknown,
}

const CODES: &[(u32, ApiErrorCode)] = &[
    (1000, ApiErrorCode::LoginRequired),
    (1001, ApiErrorCode::NoPathOrName),
    (1002, ApiErrorCode::NoPathOrFolderId),
    (1004, ApiErrorCode::NoFileIdOrPath),
    (1006, ApiErrorCode::NoFlags),
    (1007, ApiErrorCode::InvalidDescriptor),
    (1009, ApiErrorCode::NoOffset),
    (1010, ApiErrorCode::NoLength),
    (1011, ApiErrorCode::NoCount),
    (1016, ApiErrorCode::NoTarget),
    (1017, ApiErrorCode::InvalidFolderId),
    (1020, ApiErrorCode::NoLanguage),
    (1021, ApiErrorCode::LanguageNotSupported),
    (1037, ApiErrorCode::NoDestination),
    (2000, ApiErrorCode::LoginFailed),
    (2001, ApiErrorCode::InvalidName),
    (2002, ApiErrorCode::ParentMissing),
    (2003, ApiErrorCode::AccessDenied),
    (2004, ApiErrorCode::AlreadyExists),
    (2005, ApiErrorCode::DirectoryMissing),
    (2006, ApiErrorCode::FolderNotEmpty),
    (2007, ApiErrorCode::DeleteRoot),
    (2008, ApiErrorCode::OverQuota),
    (2009, ApiErrorCode::FileNotFound),
    (2010, ApiErrorCode::InvalidPath),
    (2023, ApiErrorCode::NestedShare),
    (2028, ApiErrorCode::ActiveShares),
    (2041, ApiErrorCode::ConnectionBroken),
    (2042, ApiErrorCode::RenameRoot),
    (2043, ApiErrorCode::MoveIntoSelf),
    (2119, ApiErrorCode::PlainInCrypto),
    (2206, ApiErrorCode::CopyIntoSelf),
    (2207, ApiErrorCode::CopyIntoSubfolder),
    (2208, ApiErrorCode::TargetMissing),
    (4000, ApiErrorCode::TooManyLogins),
    (5000, ApiErrorCode::Internal),
    (5001, ApiErrorCode::InternalUpload),
    (5003, ApiErrorCode::WriteError),
    (5004, ApiErrorCode::ReadError),
];

impl From<u32> for ApiErrorCode {
    fn from(code: u32) -> Self {
        CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, e)| *e)
            .unwrap_or(ApiErrorCode::Unknown)
    }
}

impl ApiErrorCode {
    /// Numeric code as sent by the server (0 for `Unknown`).
    pub fn code(&self) -> u32 {
        CODES
            .iter()
            .find(|(_, e)| e == self)
            .map(|(c, _)| *c)
            .unwrap_or(0)
    }

    /// Get human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorCode::LoginRequired => "Log in required",
            ApiErrorCode::NoPathOrName => "No full path or name/folderid provided",
            ApiErrorCode::NoPathOrFolderId => "No full path or folderid provided",
            ApiErrorCode::NoFileIdOrPath => "No fileid or path provided",
            ApiErrorCode::NoFlags => "Please provide flags",
            ApiErrorCode::InvalidDescriptor => "Invalid or closed file descriptor",
            ApiErrorCode::NoOffset => "Please provide 'offset'",
            ApiErrorCode::NoLength => "Please provide 'length'",
            ApiErrorCode::NoCount => "Please provide 'count'",
            ApiErrorCode::NoTarget => "No full topath or toname/tofolderid provided",
            ApiErrorCode::InvalidFolderId => "Invalid 'folderid' provided",
            ApiErrorCode::NoLanguage => "Please provide language",
            ApiErrorCode::LanguageNotSupported => "Language not supported",
            ApiErrorCode::NoDestination => {
                "Please provide at least one of 'topath', 'tofolderid' or 'toname'"
            }
            ApiErrorCode::LoginFailed => "Log in failed",
            ApiErrorCode::InvalidName => "Invalid file/folder name",
            ApiErrorCode::ParentMissing => "A component of parent directory does not exist",
            ApiErrorCode::AccessDenied => {
                "Access denied, you do not have permissions to perform this operation"
            }
            ApiErrorCode::AlreadyExists => "File or folder already exists",
            ApiErrorCode::DirectoryMissing => "Directory does not exist",
            ApiErrorCode::FolderNotEmpty => "Folder is not empty",
            ApiErrorCode::DeleteRoot => "Cannot delete the root folder",
            ApiErrorCode::OverQuota => "User is over quota",
            ApiErrorCode::FileNotFound => "File not found",
            ApiErrorCode::InvalidPath => "Invalid path",
            ApiErrorCode::NestedShare => {
                "You are trying to place shared folder into another shared folder"
            }
            ApiErrorCode::ActiveShares => {
                "There are active shares or sharerequests for this folder"
            }
            ApiErrorCode::ConnectionBroken => "Connection broken",
            ApiErrorCode::RenameRoot => "Cannot rename the root folder",
            ApiErrorCode::MoveIntoSelf => "Cannot move a folder to a subfolder of itself",
            ApiErrorCode::PlainInCrypto => "Can not create non-encrypted file in encrypted folder",
            ApiErrorCode::CopyIntoSelf => "Can not copy folder into itself",
            ApiErrorCode::CopyIntoSubfolder => "Can not copy folder to subfolder of itself",
            ApiErrorCode::TargetMissing => "Target folder does not exist",
            ApiErrorCode::TooManyLogins => "Too many login tries from this IP address",
            ApiErrorCode::Internal => "Internal error, try again later",
            ApiErrorCode::InternalUpload => "Internal upload error",
            ApiErrorCode::WriteError => "Write error, try reopening the file",
            ApiErrorCode::ReadError => "Read error, try reopening the file",
            ApiErrorCode::Unknown => "Unknown pCloud error",
        }
    }
}
