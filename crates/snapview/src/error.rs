use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SnapviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid glob pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("failed to parse snapshot file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("folder tree error: {0}")]
    Tree(String),

    #[error("watcher error: {0}")]
    Watch(String),
}

pub type Result<T> = std::result::Result<T, SnapviewError>;
