//! Error types for event transformation and export.

use std::path::PathBuf;

use thiserror::Error;

/// An error raised while transforming or exporting events.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A user-supplied regular expression failed to compile.
    #[error("invalid {what} pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Which option the pattern came from (e.g. "name filter").
        what: &'static str,
        /// The pattern as given.
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Reading or writing an exported page failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Creates an IO error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_display() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = CoreError::InvalidPattern {
            what: "title cleanup",
            pattern: "(".to_string(),
            source,
        };
        let display = err.to_string();
        assert!(display.contains("title cleanup"));
        assert!(display.contains("`(`"));
    }

    #[test]
    fn io_error_has_source() {
        use std::error::Error;
        let err = CoreError::io("/tmp/out.md", std::io::Error::other("disk full"));
        assert!(err.to_string().contains("/tmp/out.md"));
        assert!(err.source().is_some());
    }
}
