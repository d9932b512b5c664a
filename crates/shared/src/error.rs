use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    ModelUnavailable,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16, detail: &str) -> Self {
        match status {
            400 | 415 | 422 => Self::Validation,
            404 => Self::NotFound,
            503 => Self::ModelUnavailable,
            500 if detail.to_ascii_lowercase().contains("not initialized") => {
                Self::ModelUnavailable
            }
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Decodes the `{"detail": ...}` body the service returns on failure.
    pub fn from_response_body(status: u16, body: &str) -> Option<Self> {
        let parsed: ServiceErrorBody = serde_json::from_str(body).ok()?;
        let detail = match parsed.detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        Some(Self::new(ErrorCode::from_status(status, &detail), detail))
    }
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    detail: serde_json::Value,
}
