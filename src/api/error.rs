//! API client errors

use reqwest::StatusCode;

use crate::services::SessionError;

/// Error types for backend calls
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 401: the token was rejected; the session has been torn down
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// 403: authenticated but not allowed
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Any other non-2xx answer
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Login succeeded on the wire but the session could not be established
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Response body did not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request rejected before it was sent
    #[error("Invalid request: {0}")]
    Validation(String),
}

impl ApiError {
    /// Build the error for a non-success status and its body
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Stable code for display and logging
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Http(_) => "NETWORK_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Status { status: 404, .. } => "NOT_FOUND",
            ApiError::Status { status: 400, .. } | ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Status { status: 409, .. } => "CONFLICT",
            ApiError::Status { .. } => "BACKEND_ERROR",
            ApiError::Session(_) => "SESSION_ERROR",
            ApiError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Check if the caller should be sent to the login page.
    ///
    /// A storage failure is local and does not invalidate the credentials.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized(_)
                | ApiError::Session(SessionError::Decode(_) | SessionError::IncompleteIdentity(_))
        )
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"error": "..."}`, `{"message": "..."}` and
/// `{"error": {"message": "..."}}`; a short plain-text body is used as-is.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let candidate = value
                .get("error")
                .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(|m| m.as_str())))
                .or_else(|| value.get("message").and_then(|m| m.as_str()));
            candidate.map(str::to_string)
        }
        Err(_) if body.len() <= 200 && !body.starts_with('<') => Some(body.to_string()),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DecodeError;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            error_message(r#"{"status":400,"message":"Bad seats"}"#).as_deref(),
            Some("Bad seats")
        );
        assert_eq!(
            error_message(r#"{"error":{"code":"NOT_FOUND","message":"No ride"}}"#).as_deref(),
            Some("No ride")
        );
        assert_eq!(error_message("Ride deleted").as_deref(), Some("Ride deleted"));
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(""), None);
        assert_eq!(error_message(r#"{"other":1}"#), None);
    }

    #[test]
    fn test_from_status() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid credentials"}"#);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));
        assert!(err.requires_login());

        let err = ApiError::from_status(StatusCode::FORBIDDEN, "");
        assert!(matches!(err, ApiError::Forbidden(ref m) if m == "Forbidden"));
        assert_eq!(err.code(), "FORBIDDEN");
        assert!(!err.requires_login());

        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_requires_login_for_session_errors() {
        let err = ApiError::from(SessionError::Decode(DecodeError::Malformed("segments")));
        assert!(err.requires_login());

        let err = ApiError::from(SessionError::IncompleteIdentity("email"));
        assert!(err.requires_login());

        let err = ApiError::from(SessionError::Storage(anyhow::anyhow!("disk full")));
        assert_eq!(err.code(), "SESSION_ERROR");
        assert!(!err.requires_login());
    }
}
