//! API-specific error types
//!
//! `ApiError` is `Clone`: a coalesced read or a shared token refresh hands the
//! same settled outcome to every caller that joined it.

use lingua_domain::LinguaError;
use serde_json::Value;
use thiserror::Error;

/// Categories of API errors for caller-side handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401/403 responses and failed credential recovery
    Authentication,
    /// The session ended and the user is being sent to login
    Session,
    /// 429 responses - retry with backoff
    RateLimit,
    /// 5xx responses - retryable
    Server,
    /// Other 4xx responses and payload (de)serialization - non-retryable
    Client,
    /// No response reached the client - retryable
    Network,
    /// Construction or internal failures - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No response reached the client
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status; `body` is forwarded
    /// as-is (validation errors carry field-level detail here).
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: Value },

    /// The refresh endpoint failed or no refresh token is held
    #[error("Authentication recovery failed: {0}")]
    AuthRecovery(String),

    /// Credentials were cleared and the navigator sent to `login_location`
    #[error("Session expired, redirected to {login_location}")]
    SessionExpired { login_location: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status of a server-returned failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body of a server-returned failure
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for a 401 response
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Http { status: 401 | 403, .. } | Self::AuthRecovery(_) => {
                ApiErrorCategory::Authentication
            }
            Self::Http { status: 429, .. } => ApiErrorCategory::RateLimit,
            Self::Http { status, .. } if *status >= 500 => ApiErrorCategory::Server,
            Self::Http { .. } | Self::Decode(_) | Self::Encode(_) => ApiErrorCategory::Client,
            Self::SessionExpired { .. } => ApiErrorCategory::Session,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::Internal(_) => ApiErrorCategory::Config,
        }
    }

    /// Check if a caller may reasonably retry this error later
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }
}

/// Convert from the transport-level domain error
impl From<LinguaError> for ApiError {
    fn from(err: LinguaError) -> Self {
        match err {
            LinguaError::Network(message) => Self::Network(message),
            LinguaError::Config(message) | LinguaError::InvalidInput(message) => {
                Self::Config(message)
            }
            LinguaError::Internal(message) => Self::Internal(message),
        }
    }
}
