use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombinerError {
    #[error("Cannot read directory {path}: {reason}")]
    DirectoryUnreadable { path: PathBuf, reason: String },

    #[error("File not found: {0}")]
    FileMissing(PathBuf),

    #[error("Cannot read {path} as text: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("Path {0} is outside the workspace")]
    PathOutsideWorkspace(PathBuf),

    #[error("{0} is not a candidate file in this workspace")]
    NotACandidate(PathBuf),

    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    #[error("Clipboard is empty. Copy some text first")]
    EmptyClipboard,

    #[error("No previous versions available for {0}")]
    NoPreviousVersion(PathBuf),

    #[error("No deleted files to restore")]
    NothingToRestore,

    #[error("Invalid settings in {path}: {reason}")]
    Settings { path: PathBuf, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CombinerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CombinerError::Io {
            path: path.into(),
            source,
        }
    }
}
