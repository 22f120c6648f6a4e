//! Client error taxonomy
//!
//! Every operation in this crate returns [`ClientError`]. Variants fall into three
//! groups: transport failures, non-2xx responses from the API, and client-side
//! precondition failures that are raised before any request is sent.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection refused, DNS failure, broken body stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// 401 from the API; the session has already been cleared
    #[error("Session expired or invalid, login required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Rejected before any network call (empty submission, self-follow, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Destructive action was not confirmed by the user
    #[error("Action not confirmed")]
    NotConfirmed,

    /// Another operation on the same target is still submitting
    #[error("Operation already in progress for {0}")]
    Busy(String),

    /// The owning screen was torn down before the response was applied
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status associated with this error, if it came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether re-invoking the same action may succeed without user changes.
    ///
    /// Nothing in this crate retries automatically; this only informs the caller's
    /// messaging.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) | Self::Busy(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Precondition failures raised locally, without a request
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotConfirmed | Self::Busy(_) | Self::Cancelled
        )
    }

    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<envy::Error> for ClientError {
    fn from(err: envy::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}
