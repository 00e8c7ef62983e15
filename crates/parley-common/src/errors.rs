use std::path::PathBuf;

use crate::id::ConnectionId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures raised while handling a client event.
///
/// `InvalidRequest` and `PhaseConflict` are reported back to the caller
/// only. `UnreachableTarget` is never surfaced to a client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("phase conflict: {0}")]
    PhaseConflict(String),

    #[error("unreachable target: {0}")]
    UnreachableTarget(ConnectionId),
}

impl SessionError {
    /// Message sent to the originating connection, if any.
    pub fn client_message(&self) -> Option<String> {
        match self {
            SessionError::InvalidRequest(msg) | SessionError::PhaseConflict(msg) => {
                Some(msg.clone())
            }
            SessionError::UnreachableTarget(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
