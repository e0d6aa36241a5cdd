use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error kinds callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    RateLimitError,
    TokenLimitError,
    ApiKeyError,
    GroqApiError,
    /// Only ever logged. Store faults are recovered before they reach a caller.
    CacheError,
    ProcessingError,
    NotFoundError,
    MethodError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::RateLimitError => "rate_limit_error",
            ErrorKind::TokenLimitError => "token_limit_error",
            ErrorKind::ApiKeyError => "api_key_error",
            ErrorKind::GroqApiError => "groq_api_error",
            ErrorKind::CacheError => "cache_error",
            ErrorKind::ProcessingError => "processing_error",
            ErrorKind::NotFoundError => "not_found_error",
            ErrorKind::MethodError => "method_error",
        }
    }
}

/// Every failure a translate request can surface.
#[derive(Debug, Clone, Error)]
pub enum TranslateError {
    #[error("{message}")]
    Validation { message: String, details: String },

    #[error("Rate limit exceeded for {caller}")]
    RateLimited { caller: String, details: String },

    #[error("Token limit exceeded for {caller}")]
    TokenLimit { caller: String, details: String },

    #[error("{message}")]
    ApiKey { message: String, details: String },

    #[error("{message}")]
    Upstream {
        message: String,
        details: String,
        status: u16,
    },

    #[error("Translation processing failed")]
    Processing { details: String },

    #[error("Endpoint not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl TranslateError {
    pub fn validation(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn upstream(message: impl Into<String>, details: impl Into<String>, status: u16) -> Self {
        Self::Upstream {
            message: message.into(),
            details: details.into(),
            status,
        }
    }

    pub fn missing_api_key() -> Self {
        Self::ApiKey {
            message: "API key not configured".to_string(),
            details: "Set the GROQ_API_KEY environment variable".to_string(),
        }
    }

    pub fn rejected_api_key() -> Self {
        Self::ApiKey {
            message: "Invalid Groq API key".to_string(),
            details: "Check your GROQ_API_KEY environment variable".to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Validation { .. } => ErrorKind::ValidationError,
            TranslateError::RateLimited { .. } => ErrorKind::RateLimitError,
            TranslateError::TokenLimit { .. } => ErrorKind::TokenLimitError,
            TranslateError::ApiKey { .. } => ErrorKind::ApiKeyError,
            TranslateError::Upstream { .. } => ErrorKind::GroqApiError,
            TranslateError::Processing { .. } => ErrorKind::ProcessingError,
            TranslateError::NotFound => ErrorKind::NotFoundError,
            TranslateError::MethodNotAllowed => ErrorKind::MethodError,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            TranslateError::Validation { .. } => 400,
            TranslateError::RateLimited { .. } | TranslateError::TokenLimit { .. } => 429,
            TranslateError::ApiKey { .. } | TranslateError::Processing { .. } => 500,
            TranslateError::Upstream { status, .. } => *status,
            TranslateError::NotFound => 404,
            TranslateError::MethodNotAllowed => 405,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            TranslateError::Validation { details, .. }
            | TranslateError::RateLimited { details, .. }
            | TranslateError::TokenLimit { details, .. }
            | TranslateError::ApiKey { details, .. }
            | TranslateError::Upstream { details, .. }
            | TranslateError::Processing { details } => Some(details.as_str()),
            TranslateError::NotFound => Some("The requested API endpoint does not exist"),
            TranslateError::MethodNotAllowed => {
                Some("The HTTP method is not supported for this endpoint")
            }
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.to_string(),
            details: self.details().map(str::to_string),
            error_kind: self.kind(),
            http_status: self.status(),
            timestamp: epoch_seconds(),
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "error")]
    pub message: String,
    pub details: Option<String>,
    #[serde(rename = "error_type")]
    pub error_kind: ErrorKind,
    #[serde(rename = "status_code")]
    pub http_status: u16,
    pub timestamp: f64,
}

impl IntoResponse for TranslateError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        let status = StatusCode::from_u16(envelope.http_status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}

pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
