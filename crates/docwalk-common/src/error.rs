//! Error types for docwalk

use thiserror::Error;

/// Result type alias for docwalk operations
pub type Result<T> = std::result::Result<T, DocwalkError>;

/// Unified error type for every workflow step
#[derive(Error, Debug, Clone)]
pub enum DocwalkError {
    /// Cannot reach or authenticate to the database
    #[error("Connection error: {0}")]
    Connection(String),

    /// Insert rejected by the database
    #[error("Write error: {0}")]
    Write(String),

    /// Query execution failed
    #[error("Query error: {0}")]
    Query(String),

    /// A returned document cannot be mapped into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// A single-result lookup matched zero documents
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation deadline exceeded
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocwalkError {
    /// Returns true if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DocwalkError::Connection(_) | DocwalkError::Timeout(_)
        )
    }

    /// Returns true if a lookup matched nothing (as opposed to failing)
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocwalkError::NotFound(_))
    }
}

impl From<std::io::Error> for DocwalkError {
    fn from(err: std::io::Error) -> Self {
        DocwalkError::Internal(format!("I/O error: {}", err))
    }
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
mod mongodb_errors {
    use super::DocwalkError;
    use mongodb::error::{Error, ErrorKind};

    /// Kinds that mean the server could not be reached at all
    fn is_connectivity(kind: &ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::Io(_)
                | ErrorKind::ServerSelection { .. }
                | ErrorKind::DnsResolve { .. }
                | ErrorKind::Authentication { .. }
                | ErrorKind::InvalidTlsConfig { .. }
                | ErrorKind::ConnectionPoolCleared { .. }
        )
    }

    impl From<Error> for DocwalkError {
        fn from(err: Error) -> Self {
            let kind = err.kind.as_ref();
            if is_connectivity(kind) {
                return DocwalkError::Connection(err.to_string());
            }
            match kind {
                ErrorKind::BsonDeserialization(_) => DocwalkError::Decode(err.to_string()),
                ErrorKind::BsonSerialization(_) => DocwalkError::Serialization(err.to_string()),
                ErrorKind::Write(_) => DocwalkError::Write(err.to_string()),
                ErrorKind::Command(_) => DocwalkError::Query(err.to_string()),
                ErrorKind::InvalidArgument { .. } => DocwalkError::Validation(err.to_string()),
                _ => DocwalkError::Internal(err.to_string()),
            }
        }
    }

    impl DocwalkError {
        /// Classify a driver error raised while establishing a session
        pub fn from_connect(err: Error) -> Self {
            match DocwalkError::from(err) {
                DocwalkError::Internal(msg) | DocwalkError::Query(msg) => {
                    DocwalkError::Connection(msg)
                }
                other => other,
            }
        }

        /// Classify a driver error raised by an insert
        pub fn from_write(err: Error) -> Self {
            match DocwalkError::from(err) {
                DocwalkError::Internal(msg) | DocwalkError::Query(msg) => DocwalkError::Write(msg),
                other => other,
            }
        }

        /// Classify a driver error raised by a query or cursor advance
        pub fn from_query(err: Error) -> Self {
            match DocwalkError::from(err) {
                DocwalkError::Internal(msg) => DocwalkError::Query(msg),
                other => other,
            }
        }
    }

    impl From<bson::ser::Error> for DocwalkError {
        fn from(err: bson::ser::Error) -> Self {
            DocwalkError::Serialization(format!("BSON serialization error: {}", err))
        }
    }

    impl From<bson::de::Error> for DocwalkError {
        fn from(err: bson::de::Error) -> Self {
            DocwalkError::Decode(format!("BSON deserialization error: {}", err))
        }
    }
}

#[cfg(feature = "config-errors")]
impl From<toml::de::Error> for DocwalkError {
    fn from(err: toml::de::Error) -> Self {
        DocwalkError::Config(err.to_string())
    }
}

#[cfg(feature = "config-errors")]
impl From<toml::ser::Error> for DocwalkError {
    fn from(err: toml::ser::Error) -> Self {
        DocwalkError::Config(err.to_string())
    }
}
