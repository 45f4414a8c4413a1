use std::fmt::Display;

use thiserror::Error;

use crate::api::models::FieldError;

/// Every failure the transport can produce. Cloneable so it can sit inside
/// a lifecycle snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No usable response was obtained. Status is always 0.
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("{endpoint} responded {status}: {message}")]
    Http { endpoint: String, status: u16, message: String },

    /// A 400 whose body listed per-field problems.
    #[error("{endpoint} rejected the request: {message}")]
    Validation { endpoint: String, message: String, fields: Vec<FieldError> },
}

impl ApiError {
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Network { endpoint: endpoint.into(), message: message.into() }
    }

    /// Wraps any foreign failure into a status-0 error.
    pub fn wrap(endpoint: impl Into<String>, err: impl Display) -> Self {
        ApiError::network(endpoint, err.to_string())
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::Network { .. } => 0,
            ApiError::Http { status, .. } => *status,
            ApiError::Validation { .. } => 400,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Network { endpoint, .. }
            | ApiError::Http { endpoint, .. }
            | ApiError::Validation { endpoint, .. } => endpoint,
        }
    }

    /// Generic message, independent of any field errors.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message, .. }
            | ApiError::Http { message, .. }
            | ApiError::Validation { message, .. } => message,
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Validation { fields, .. } => fields,
            _ => &[],
        }
    }

    /// First message reported for `field`, if any.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors()
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.message.as_str())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}
