//! Error codes attached to error logs.
//!
//! Every failed request is logged with an `error_code` field so dashboards can
//! group failures without parsing messages. Codes are grouped in ranges:
//! - 1000-1999: client errors
//! - 2000-2999: storage errors
//! - 3000-3999: request lifecycle
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! assert_eq!(ErrorCode::ValidationError.as_str(), "VALIDATION_ERROR");
//! assert_eq!(ErrorCode::ValidationError.code(), 1001);
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationError,
    JsonExtraction,
    NotFound,
    Conflict,

    DatabaseError,
    DatabaseUnavailable,

    RequestCancelled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::DatabaseUnavailable => "DATABASE_UNAVAILABLE",
            Self::RequestCancelled => "REQUEST_CANCELLED",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Conflict => 1008,

            Self::DatabaseError => 2003,
            Self::DatabaseUnavailable => 2013,

            Self::RequestCancelled => 3002,
        }
    }

    /// Message used when the caller has nothing more specific to say.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "One or more validation errors occurred.",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource already exists",
            Self::DatabaseError => "An internal server error occurred",
            Self::DatabaseUnavailable => "Service is temporarily unavailable",
            Self::RequestCancelled => "Request was cancelled",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
