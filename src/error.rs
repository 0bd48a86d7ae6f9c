use thiserror::Error;

/// Main error type for relgraph
#[derive(Error, Debug)]
pub enum RelgraphError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uploaded table lacks one or more required columns
    #[error("CSV must contain columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A query arrived before any table was ingested
    #[error("No graph loaded")]
    NoGraphLoaded,

    /// Root entity is not present in the store
    #[error("Entity not found: {0}")]
    UnknownEntity(String),

    /// No exploration session with this id
    #[error("Session not found: {0}")]
    UnknownSession(String),

    /// Radial depth outside the supported range
    #[error("Invalid depth {depth}: must be between 1 and {max}")]
    InvalidDepth { depth: i64, max: usize },

    /// Layout input contained the same node id twice
    #[error("Duplicate node in layout input: {0}")]
    DuplicateNode(String),
}

/// Convenient Result type using RelgraphError
pub type Result<T> = std::result::Result<T, RelgraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelgraphError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_query_error_display() {
        let err = RelgraphError::InvalidDepth { depth: 9, max: 5 };
        assert_eq!(err.to_string(), "Invalid depth 9: must be between 1 and 5");

        let err = RelgraphError::UnknownSession("42".to_string());
        assert_eq!(err.to_string(), "Session not found: 42");

        let err = RelgraphError::MissingColumns(vec!["entity_to".to_string(), "relationship_type".to_string()]);
        assert!(err.to_string().contains("entity_to, relationship_type"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: RelgraphError = rusqlite_err.into();
        assert!(matches!(err, RelgraphError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RelgraphError = io_err.into();
        assert!(matches!(err, RelgraphError::Io(_)));
    }
}
