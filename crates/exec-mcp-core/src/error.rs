//! Error types for the exec MCP server.

use thiserror::Error;

/// Main error type for exec MCP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport to the interactive process failed mid-operation.
    ///
    /// This is the only variant the dispatcher recovers from: one automatic
    /// session recreation and resend. A second occurrence is fatal.
    #[error("Connection to session process lost: {0}")]
    ConnectionLost(String),

    /// The interactive process could not be spawned.
    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error qualifies for the dispatcher's one-shot
    /// reset-and-resend recovery.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::ConnectionLost(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lost_error() {
        let err = Error::ConnectionLost("broken pipe".to_string());
        assert_eq!(
            err.to_string(),
            "Connection to session process lost: broken pipe"
        );
        assert!(err.is_transport());
    }

    #[test]
    fn test_spawn_error_is_not_transport() {
        let err = Error::Spawn("no such file".to_string());
        assert_eq!(err.to_string(), "Failed to spawn process: no such file");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_config_error() {
        let err = Error::Config("missing executable".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing executable");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_other_error() {
        let err = Error::Other("unknown error".to_string());
        assert_eq!(err.to_string(), "unknown error");
    }

    #[test]
    fn test_error_debug() {
        let err = Error::Spawn("exec format error".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Spawn"));
    }
}
