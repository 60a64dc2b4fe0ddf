//! Errors returned by a retrieval channel.

use thiserror::Error;

/// Failure of a single retrieval attempt.
///
/// Split into two classes that the fetcher treats differently:
/// - connectivity (`Connection`, `Timeout`): retried, counted by the breaker
/// - protocol/data (`Rejected`, `InvalidResponse`, `InvalidUrl`): surfaced
///   once, not retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Remote rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from booking API: {0}")]
    InvalidResponse(String),

    #[error("Invalid booking API URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl ChannelError {
    /// Whether this failure says the channel itself is unreachable.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ChannelError::Connection(_) | ChannelError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(ChannelError::Timeout.is_connectivity());
        assert!(ChannelError::Connection("refused".into()).is_connectivity());
        assert!(
            !ChannelError::Rejected {
                status: 404,
                message: "no such origin".into()
            }
            .is_connectivity()
        );
        assert!(!ChannelError::InvalidResponse("not an array".into()).is_connectivity());
        assert!(
            !ChannelError::InvalidUrl {
                url: "not a url".into(),
                message: "relative URL without a base".into()
            }
            .is_connectivity()
        );
    }
}
