use thiserror::Error;

/// Reason surfaced when a request exceeds the client timeout.
pub const TIMEOUT_REASON: &str = "Network error: request timed out";

/// Failure of a single call to the blog API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request rejected with status {status}")]
    Rejected {
        status: u16,
        /// Message from the `{"error": ...}` body, when the server sent one.
        message: Option<String>,
    },
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RequestError {
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }

    /// True when the API refused the credential itself.
    ///
    /// The backend answers 401 for expired tokens and 422 for malformed ones.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status == 401 || *status == 422)
    }

    /// Text shown to the user: the API message if any, a network reason for
    /// timeouts, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(message) = self.api_message() {
            return message.to_string();
        }
        match self {
            Self::Timeout => TIMEOUT_REASON.to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Login, signup or token renewal was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn from_request(err: &RequestError, fallback: &str) -> Self {
        Self::new(err.user_message(fallback))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A list page could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct FetchError {
    reason: String,
}

impl FetchError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn from_request(err: &RequestError, fallback: &str) -> Self {
        Self::new(err.user_message(fallback))
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// The stored session could not be confirmed with the API.
///
/// Handled inside the session store as an implicit logout.
#[derive(Debug, Error)]
pub(crate) enum SessionExpired {
    #[error("no stored credential token")]
    MissingToken,
    #[error("credential token store unavailable: {0}")]
    Storage(anyhow::Error),
    #[error("current user lookup failed: {0}")]
    Rejected(RequestError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_wins_over_fallback() {
        let err = RequestError::Rejected {
            status: 401,
            message: Some("Invalid email or password".into()),
        };
        assert_eq!(err.user_message("Login failed"), "Invalid email or password");
        assert_eq!(
            AuthError::from_request(&err, "Login failed").message(),
            "Invalid email or password"
        );
    }

    #[test]
    fn missing_api_message_uses_fallback() {
        let err = RequestError::Rejected {
            status: 500,
            message: None,
        };
        assert_eq!(
            FetchError::from_request(&err, "Failed to load posts").reason(),
            "Failed to load posts"
        );
        let err = RequestError::Transport("connection refused".into());
        assert_eq!(err.user_message("Signup failed"), "Signup failed");
    }

    #[test]
    fn timeout_reports_network_reason() {
        assert_eq!(
            RequestError::Timeout.user_message("Failed to load posts"),
            TIMEOUT_REASON
        );
    }

    #[test]
    fn unauthorized_covers_expired_and_malformed_tokens() {
        let expired = RequestError::Rejected {
            status: 401,
            message: None,
        };
        let malformed = RequestError::Rejected {
            status: 422,
            message: None,
        };
        let missing = RequestError::Rejected {
            status: 404,
            message: Some("User not found".into()),
        };
        assert!(expired.is_unauthorized());
        assert!(malformed.is_unauthorized());
        assert!(!missing.is_unauthorized());
        assert!(!RequestError::Timeout.is_unauthorized());
    }
}
