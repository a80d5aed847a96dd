//! Error types for the FlowMancer client

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the FlowMancer client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}, {code}): {message}")]
    ApiError {
        status: u16,
        /// Machine-readable code from the error body, `unknown` when absent
        code: String,
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Execution did not finish in time
    #[error("Execution {id} still running after {waited:?}")]
    Timeout { id: Uuid, waited: Duration },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

impl ClientError {
    /// Builds an API error from a response body; `{error, code}` bodies are unpacked
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::ApiError {
                status,
                code: parsed.code,
                message: parsed.error,
            },
            Err(_) => Self::ApiError {
                status,
                code: "unknown".to_string(),
                message: body.to_string(),
            },
        }
    }

    /// Machine-readable code of an API error
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::ApiError { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_error_body() {
        let err = ClientError::from_body(409, r#"{"error":"workflow 'x' is inactive","code":"inactive"}"#);
        assert_eq!(err.code(), Some("inactive"));
        assert!(err.is_client_error());
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "API error (status 409, inactive): workflow 'x' is inactive"
        );
    }

    #[test]
    fn test_plain_error_body() {
        let err = ClientError::from_body(502, "Bad Gateway");
        assert_eq!(err.code(), Some("unknown"));
        assert!(err.is_server_error());
    }
}
