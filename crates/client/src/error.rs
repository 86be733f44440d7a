//! Error types.
//!
//! [`ApiError`] describes what went wrong on the wire. State containers and
//! account services never hand it to callers directly: every operation
//! resolves to an [`Outcome`], whose error side is a [`Failure`] carrying a
//! message that can be shown to the shopper as-is.

use thiserror::Error;

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the session credential (HTTP 401).
    #[error("Unauthorized{}", format_message(.message.as_deref()))]
    Unauthorized {
        /// Server-provided reason, if any.
        message: Option<String>,
    },

    /// The API refused the request (4xx/5xx other than 401).
    #[error("Request rejected with status {status}{}", format_message(.message.as_deref()))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server-provided reason from the `error` field, if any.
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

fn format_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(": {m}"))
}

impl ApiError {
    /// The reason the server gave, if it gave one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Rejected { message, .. } => message.as_deref(),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// HTTP status, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Rejected { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) => None,
        }
    }
}

/// Broad category of a [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected locally before any request was sent.
    Validation,
    /// The operation needs a signed-in account, or the credential expired.
    Unauthorized,
    /// The API refused the request (out of stock, duplicate email, ...).
    Rejected,
    /// The API could not be reached.
    Network,
    /// The API answered with something unexpected.
    Unexpected,
    /// Another operation on the same item has not finished yet.
    Busy,
}

/// A failed operation, ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
}

/// Result of every user-facing operation.
pub type Outcome<T = ()> = Result<T, Failure>;

impl Failure {
    /// Create a failure of the given kind.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A local validation failure; nothing was sent to the API.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    /// The operation requires a signed-in account.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unauthorized, message)
    }

    /// Translate an API error, preferring the server's own reason and
    /// falling back to `fallback`.
    ///
    /// Unexpected response shapes are logged here and never shown verbatim.
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        let kind = match err {
            ApiError::Http(_) => FailureKind::Network,
            ApiError::Unauthorized { .. } => FailureKind::Unauthorized,
            ApiError::Rejected { .. } => FailureKind::Rejected,
            ApiError::Parse(e) => {
                tracing::error!(error = %e, "Unexpected response shape from storefront API");
                FailureKind::Unexpected
            }
        };
        let message = err.server_message().unwrap_or(fallback);
        Self::new(kind, message)
    }

    /// Category of the failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = ApiError::Rejected {
            status: 409,
            message: Some("Email already registered".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Request rejected with status 409: Email already registered"
        );
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_failure_prefers_server_message() {
        let err = ApiError::Rejected {
            status: 400,
            message: Some("Out of stock".to_string()),
        };
        let failure = Failure::from_api(&err, "Failed to add to cart");
        assert_eq!(failure.message(), "Out of stock");
        assert_eq!(failure.kind(), FailureKind::Rejected);
    }

    #[test]
    fn test_failure_falls_back() {
        let err = ApiError::Unauthorized { message: None };
        let failure = Failure::from_api(&err, "Login failed");
        assert_eq!(failure.to_string(), "Login failed");
        assert_eq!(failure.kind(), FailureKind::Unauthorized);
    }

    #[test]
    fn test_parse_errors_are_not_shown() {
        let parse = serde_json::from_str::<u32>("{").unwrap_err();
        let failure = Failure::from_api(&ApiError::Parse(parse), "Failed to load cart");
        assert_eq!(failure.message(), "Failed to load cart");
        assert_eq!(failure.kind(), FailureKind::Unexpected);
    }
}
