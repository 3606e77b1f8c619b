use http::StatusCode;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SubforgeError {
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(BTreeMap<String, String>),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Database not connected")]
    NotConnected,

    #[error("Max reconnection attempts reached ({attempts})")]
    RetriesExhausted { attempts: u32 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, SubforgeError>;

fn format_field_errors(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{}: {}", field, msg))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SubforgeError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.into());
        SubforgeError::Validation(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SubforgeError::Validation(_) => StatusCode::BAD_REQUEST,
            SubforgeError::InvalidId(_) => StatusCode::BAD_REQUEST,
            SubforgeError::UserNotFound(_) => StatusCode::NOT_FOUND,
            SubforgeError::DuplicateEmail(_) => StatusCode::CONFLICT,
            SubforgeError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            SubforgeError::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            SubforgeError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SubforgeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SubforgeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for SubforgeError {
    fn from(e: std::io::Error) -> Self {
        SubforgeError::Io(e.to_string())
    }
}

impl From<mongodb::error::Error> for SubforgeError {
    fn from(e: mongodb::error::Error) -> Self {
        SubforgeError::Database(e.to_string())
    }
}

impl From<mongodb::bson::oid::Error> for SubforgeError {
    fn from(e: mongodb::bson::oid::Error) -> Self {
        SubforgeError::InvalidId(e.to_string())
    }
}

// Axum IntoResponse implementation (feature-gated)
#[cfg(feature = "axum-support")]
use axum::response::{IntoResponse, Json, Response};
#[cfg(feature = "axum-support")]
use serde::Serialize;

#[cfg(feature = "axum-support")]
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

#[cfg(feature = "axum-support")]
impl IntoResponse for SubforgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, errors) = match &self {
            SubforgeError::Validation(fields) => (
                "Validation Error".to_string(),
                Some(serde_json::json!(fields)),
            ),
            SubforgeError::InvalidId(_) => (
                "Invalid ID".to_string(),
                Some(serde_json::json!({ "id": "Invalid id" })),
            ),
            SubforgeError::UserNotFound(_) => ("User not found".to_string(), None),
            SubforgeError::DuplicateEmail(_) => (
                "Duplicate Error".to_string(),
                Some(serde_json::json!({ "email": "email already exists" })),
            ),
            SubforgeError::NotConnected | SubforgeError::RetriesExhausted { .. } => (
                "MongoDB connection is not available".to_string(),
                None,
            ),
            SubforgeError::Database(_) | SubforgeError::Config(_) | SubforgeError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                let details = crate::config::is_development()
                    .then(|| serde_json::Value::String(self.to_string()));
                ("Internal Server Error".to_string(), details)
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SubforgeError::field("name", "Name is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SubforgeError::UserNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SubforgeError::DuplicateEmail("a@b.co".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            SubforgeError::NotConnected.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            SubforgeError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_display_lists_fields() {
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "Invalid email address".to_string());
        errors.insert("name".to_string(), "Name is required".to_string());
        let msg = SubforgeError::Validation(errors).to_string();
        assert_eq!(
            msg,
            "Validation failed: email: Invalid email address, name: Name is required"
        );
    }
}
