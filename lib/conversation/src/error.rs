//! Error types for the conversation crate.
//!
//! Directory failures never appear here: the state machine converts them
//! into user-visible text at its boundary. Only store and transport
//! failures propagate to the caller.

use std::fmt;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the operation failed.
    Unavailable { reason: String },
    /// A stored record could not be encoded or decoded.
    Serialization { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "session store unavailable: {reason}"),
            Self::Serialization { reason } => {
                write!(f, "session record serialization failed: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from sending outbound chat messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The message could not be delivered to the transport.
    SendFailed { reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { reason } => write!(f, "failed to send chat message: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors returned by the state machine's handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// Session store failure; the operation was aborted.
    Store(StoreError),
    /// Outbound message failure.
    Transport(TransportError),
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for HandleError {}

impl From<StoreError> for HandleError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<TransportError> for HandleError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::Unavailable {
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn handle_error_wraps_transport() {
        let err = HandleError::from(TransportError::SendFailed {
            reason: "timeout".to_string(),
        });
        assert!(err.to_string().contains("timeout"));
    }
}
