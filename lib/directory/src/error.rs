//! Error types for the directory crate.

use std::fmt;

/// Errors from venue directory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The HTTP request could not be sent or completed.
    RequestFailed { reason: String },
    /// The service answered with a non-success status code.
    UnexpectedStatus { status: u16 },
    /// The response body could not be decoded into the expected shape.
    MalformedResponse { reason: String },
    /// The venue's raw track id does not carry a usable slug.
    InvalidTrackId { track_id: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "directory request failed: {reason}"),
            Self::UnexpectedStatus { status } => {
                write!(f, "directory returned unexpected status: {status}")
            }
            Self::MalformedResponse { reason } => {
                write!(f, "directory response malformed: {reason}")
            }
            Self::InvalidTrackId { track_id } => {
                write!(f, "venue track id has no slug: {track_id}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<reqwest::Error> for DirectoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse {
                reason: e.to_string(),
            }
        } else {
            Self::RequestFailed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_display() {
        let err = DirectoryError::UnexpectedStatus { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn invalid_track_id_display() {
        let err = DirectoryError::InvalidTrackId {
            track_id: "category-pizza".to_string(),
        };
        assert!(err.to_string().contains("category-pizza"));
    }
}
