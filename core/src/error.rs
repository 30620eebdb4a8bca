use thiserror::Error;

/// Structured error kinds for every `FileService` implementation.
///
/// Mirrors the original's errno-style failures (`ENOENT`, `ENOTDIR`,
/// `EISDIR`, `EEXIST`) without a separate errno field: `Io` carries the
/// originating `std::io::Error`, whose `.kind()`/`.raw_os_error()` already
/// hold that information.
#[derive(Debug, Error)]
pub enum FileServiceError {
    #[error("no such file or directory: {path}")]
    NotFound { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("invalid path: {path}")]
    InvalidPath { path: String },

    #[error("invalid url: {url}")]
    InvalidUrl { url: String },

    #[error("logic error: {0}")]
    Logic(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, FileServiceError>;

impl FileServiceError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        FileServiceError::Io {
            path: path.into(),
            source,
        }
    }

    /// True if this error represents a missing path, the way the original
    /// code distinguishes "not found" for retry/swallow purposes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileServiceError::NotFound { .. })
            || matches!(self, FileServiceError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
