//! Error types for Impacto

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::EntityKind;

/// Result type alias using Impacto's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by configuration file errors
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Impacto error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Remote knowledge errors (E100-E199)
    #[error("Remote documentation tool timed out after {0} ms and was terminated.")]
    RemoteTimeout(u64),

    #[error("Remote documentation tool exited with {}: {stderr}", exit_label(.exit_code))]
    RemoteProcess {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Malformed response from remote documentation tool: {0}")]
    RemoteParse(String),

    #[error("Remote documentation tool rejected the request ({code}): {message}")]
    RemoteRejected { code: i64, message: String },

    #[error("Network error: {0}. Check the secondary service URL.")]
    Network(#[from] reqwest::Error),

    // Lookup errors (E200-E299)
    #[error("{kind} '{id}' not found.")]
    NotFound { kind: EntityKind, id: String },

    // Configuration errors (E300-E399)
    #[error("Configuration file error at {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: BoxedCause,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "no exit code (killed by signal)".to_string(),
    }
}

impl Error {
    /// Shorthand for a missing entity
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wrap any failure raised while reading or writing a mapping file
    pub fn config_io(path: impl Into<PathBuf>, source: impl Into<BoxedCause>) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether this error came from the remote documentation tool
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteTimeout(_)
                | Self::RemoteProcess { .. }
                | Self::RemoteParse(_)
                | Self::RemoteRejected { .. }
        )
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::RemoteTimeout(_) => "E100",
            Self::RemoteProcess { .. } => "E101",
            Self::RemoteParse(_) => "E102",
            Self::RemoteRejected { .. } => "E103",
            Self::Network(_) => "E110",
            Self::NotFound { .. } => "E200",
            Self::ConfigIo { .. } => "E300",
            Self::Config(_) => "E301",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::RemoteTimeout(_) => {
                Some("impacto config set remote.request_timeout_ms <millis>".to_string())
            }
            Self::RemoteProcess { .. } => Some("impacto config get remote.tool_path".to_string()),
            Self::Network(_) => Some("impacto config get secondary.base_url".to_string()),
            Self::NotFound { kind, .. } => Some(format!("impacto {} list", kind.plural())),
            Self::Config(_) => Some("impacto config show".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_remote_timeout_error() {
        let error = Error::RemoteTimeout(30_000);
        assert_eq!(error.code(), "E100");
        assert!(error.is_remote());
        assert!(error.to_string().contains("30000"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_remote_process_error_message() {
        let error = Error::RemoteProcess {
            exit_code: Some(3),
            stderr: "boom".to_string(),
        };
        assert_eq!(error.code(), "E101");
        assert!(error.to_string().contains("code 3"));
        assert!(error.to_string().contains("boom"));

        let killed = Error::RemoteProcess {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
    }

    #[test]
    fn test_not_found_error() {
        let error = Error::not_found(EntityKind::Component, "pdf-gen");
        assert_eq!(error.code(), "E200");
        assert!(!error.is_remote());
        assert_eq!(error.to_string(), "Component 'pdf-gen' not found.");
        assert_eq!(
            error.suggestion(),
            Some("impacto components list".to_string())
        );
    }

    #[test]
    fn test_config_io_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let error = Error::config_io("/tmp/mapping.yaml", cause);

        assert_eq!(error.code(), "E300");
        assert!(error.to_string().contains("/tmp/mapping.yaml"));
        let source = error.source().expect("cause should be kept");
        assert!(source.to_string().contains("missing file"));
    }
}
