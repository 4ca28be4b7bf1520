use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authorized - please sign in again")]
    Authorization,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Invalid request or response: {0}")]
    Validation(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Map a non-success status. 401 is only final once the refresh-retry
    /// cycle has run.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Authorization,
            400..=499 => ApiError::Validation(format!("Status {}: {}", status, truncated)),
            code => ApiError::Server {
                status: code,
                body: truncated,
            },
        }
    }

    /// Response body did not match the endpoint schema.
    pub fn schema(endpoint: &str, err: serde_json::Error) -> Self {
        ApiError::Validation(format!("Unexpected response from {}: {}", endpoint, err))
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, ApiError::Authorization)
    }

    /// Message for the screen that issued the request.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Authorization => "Your session has expired. Please sign in again.",
            ApiError::Network(_) => "Could not reach the server. Check your connection.",
            ApiError::Server { .. } => "The server had a problem. Please try again later.",
            ApiError::Validation(_) => "Some information was not accepted. Please review it.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Authorization
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "missing field"),
            ApiError::Validation(ref m) if m.contains("missing field")
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::Server { status: 500, .. }
        ));
        // 3xx reaching us is still a failure
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_MODIFIED, ""),
            ApiError::Server { status: 304, .. }
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}
