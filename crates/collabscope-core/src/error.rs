use std::path::PathBuf;

/// Errors that can occur across the Collabscope platform.
///
/// Each variant wraps a specific failure domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use collabscope_core::CollabError;
///
/// let err = CollabError::Config("missing weights table".into());
/// assert!(err.to_string().contains("missing weights table"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The repository path does not exist on disk.
    #[error("repository path does not exist: {}", .0.display())]
    RepositoryPathMissing(PathBuf),

    /// The path exists but is not inside a git working tree.
    #[error("not a git repository: {}", .0.display())]
    NotAGitRepository(PathBuf),

    /// The git invocation failed for a reason other than an empty repository.
    #[error("history extraction failed: {0}")]
    HistoryExtraction(String),

    /// An export format the serializer does not understand.
    #[error("unsupported export format: {0}")]
    UnsupportedExportFormat(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Persistence-layer failure.
    #[error("store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CollabError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn missing_path_shows_path() {
        let err = CollabError::RepositoryPathMissing(PathBuf::from("/tmp/nowhere"));
        assert!(err.to_string().contains("/tmp/nowhere"));
    }

    #[test]
    fn unsupported_format_names_the_format() {
        let err = CollabError::UnsupportedExportFormat("xml".into());
        assert_eq!(err.to_string(), "unsupported export format: xml");
    }
}
