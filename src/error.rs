use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("No version in {index} matches '{pattern}'")]
    VersionNotFound { pattern: String, index: String },

    #[error("Failed to download {uri}: {reason}")]
    Download { uri: String, reason: String },

    #[error("Failed to parse repository index {uri}: {source}")]
    Index {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to extract {}: {source}", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Expected {} after extraction but it was not found", .0.display())]
    MissingExtractedBinary(PathBuf),

    #[error("Failed to set executable permissions on {}: {source}", path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Application root is not a directory: {}", .0.display())]
    ApplicationRoot(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("stack_threads is not configured; the memory calculator requires a thread count")]
    MissingStackThreads,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn download(uri: &str, reason: impl std::fmt::Display) -> Self {
        Self::Download {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }
}
