use thiserror::Error;

/// Message used when an error response carries no parsable body
pub const GENERIC_NETWORK_ERROR: &str = "Network error";

#[derive(Debug, Error)]
pub enum RequestError {
    /// Non-2xx response; `message` is the server's `error` field or `HTTP <status>`
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestError {
    /// HTTP status for server-reported failures
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Failures worth retrying at the caller's next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, RequestError::Timeout | RequestError::Connect(_))
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_connect() {
            RequestError::Connect(err.to_string())
        } else if err.is_builder() {
            RequestError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            RequestError::Decode(err.to_string())
        } else {
            RequestError::Network(err.to_string())
        }
    }
}

/// Build the failure for a non-2xx response from its raw body
pub fn from_error_body(status: u16, body: &[u8]) -> RequestError {
    let message = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(|e| e.as_str())
            .filter(|e| !e.trim().is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => GENERIC_NETWORK_ERROR.to_string(),
    };

    RequestError::Http { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_message_wins() {
        let err = from_error_body(409, br#"{"error": "Topic already being generated"}"#);
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "Topic already being generated");
    }

    #[test]
    fn json_without_error_field_reports_status() {
        let err = from_error_body(404, br#"{"detail": "nope"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404");

        let err = from_error_body(500, br#"{"error": ""}"#);
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn unparsable_body_degrades_to_generic_message() {
        let err = from_error_body(502, b"<html>Bad Gateway</html>");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), GENERIC_NETWORK_ERROR);

        let err = from_error_body(503, b"");
        assert_eq!(err.to_string(), GENERIC_NETWORK_ERROR);
    }

    #[test]
    fn transient_classification() {
        assert!(RequestError::Timeout.is_transient());
        assert!(RequestError::Connect("refused".into()).is_transient());
        assert!(!from_error_body(500, b"{}").is_transient());
        assert!(!RequestError::Decode("eof".into()).is_transient());
    }
}
