use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Backend returned {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether the presentation layer should offer a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => false,
        }
    }

    /// Build a status error from a non-2xx response.
    ///
    /// Understands `{"detail": {"error": CODE, "message": ...}}`,
    /// `{"detail": "..."}` and falls back to the raw body.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        let detail = parsed.as_ref().and_then(|v| v.get("detail"));

        let (code, message) = match detail {
            Some(Value::Object(obj)) => {
                let code = obj.get("error").and_then(Value::as_str).map(str::to_string);
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| code.clone())
                    .unwrap_or_else(|| Value::Object(obj.clone()).to_string());
                (code, message)
            }
            Some(Value::String(text)) => (None, text.clone()),
            Some(other) => (None, other.to_string()),
            None => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                let message = if text.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    text
                };
                (None, message)
            }
        };

        ApiError::Status {
            status,
            code,
            message,
        }
    }
}
