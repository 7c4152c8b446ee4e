use thiserror::Error;

/// Unified error type for the Parley application
#[derive(Error, Debug)]
pub enum ChatError {
    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Startup errors
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    // Dispatch errors
    #[error("Dispatch pool is no longer accepting jobs")]
    DispatchClosed,
}

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, ChatError>;

impl ChatError {
    /// Check if this error should terminate the process rather than a
    /// single connection
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ChatError::Bind { .. } | ChatError::InvalidConfig(_) | ChatError::InvalidAddress(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let bind = ChatError::Bind {
            addr: "0.0.0.0:50123".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(bind.is_fatal());
        assert!(ChatError::InvalidConfig("bad".to_string()).is_fatal());

        assert!(!ChatError::DispatchClosed.is_fatal());
        assert!(!ChatError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe"
        ))
        .is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = ChatError::Bind {
            addr: "0.0.0.0:50123".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert_eq!(err.to_string(), "Failed to bind 0.0.0.0:50123: in use");
        assert_eq!(
            ChatError::DispatchClosed.to_string(),
            "Dispatch pool is no longer accepting jobs"
        );
    }
}
