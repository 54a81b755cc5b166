use std::path::PathBuf;

/// Result type for scan operations
pub type Result<T> = std::result::Result<T, FinderError>;

/// Errors that can occur while scanning sources
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
  /// A source root with depth >= 1 is not a directory.
  #[error("Not a directory: {}", .path.display())]
  NotADirectory { path: PathBuf },
  /// Reading or statting a directory failed.
  #[error("Failed to scan {}: {source}", .path.display())]
  TraversalFailed {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Scan worker for {root} panicked")]
  WorkerPanicked { root: String },
  #[error("Scan supervisor failed: {0}")]
  Supervisor(#[from] tokio::task::JoinError),
}
