use serde::{Deserialize, Serialize};

/// Error body returned by every failing API route: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Parses an error body, returning the message only when it is non-blank.
    pub fn message_from_body(body: &str) -> Option<String> {
        let parsed: Self = serde_json::from_str(body).ok()?;
        let trimmed = parsed.error.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
