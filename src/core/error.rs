//! # Error Handling Module
//!
//! This module provides the error type shared by the storefront API server and the
//! shopper-side client. It is built on the `thiserror` crate and maps every failure
//! to the HTTP status and JSON body the storefront API has always returned:
//!
//! ```json
//! { "success": false, "message": "Invalid email or password" }
//! ```
//!
//! ## Rust Error Handling Concepts
//!
//! - `Result<T, E>` instead of exceptions: handlers return `StoreResult<T>` and the
//!   `?` operator propagates failures up to axum, which turns them into responses
//!   through the `IntoResponse` implementation below.
//! - One enum, many variants: pattern matching in `status_code()` guarantees that
//!   every error condition has a status code.
//! - `From` conversions let library errors (I/O, JSON, YAML, HTTP client) flow
//!   through `?` without manual mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the storefront
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for the storefront server and client
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Configuration-related errors (invalid config, unreadable files, bad env overrides)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Request or form validation failures
    #[error("{reason}")]
    Validation { field: String, reason: String },

    /// Login with an unknown email or a wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A product, order or route that does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Inventory check failed for one of the ordered items
    #[error("Product {product} is out of stock")]
    OutOfStock { product: String },

    /// The payment gateway declined the charge
    #[error("{reason}")]
    PaymentDeclined { reason: String },

    /// Telemetry pipeline could not be built or shut down
    #[error("Telemetry error: {message}")]
    Telemetry { message: String },

    /// Internal server errors for unexpected failures
    #[error("Internal server error: {message}")]
    Internal { message: String },

    /// I/O errors (file operations, socket binding, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },

    /// HTTP client errors when the storefront calls the API
    #[error("HTTP client error: {message}")]
    HttpClient { message: String },

    /// The API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl StoreError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error for a specific field
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error for a resource ("Product", "Order", ...)
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a telemetry error with a custom message
    pub fn telemetry<S: Into<String>>(message: S) -> Self {
        Self::Telemetry {
            message: message.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::OutOfStock { .. } => StatusCode::BAD_REQUEST,
            Self::PaymentDeclined { .. } => StatusCode::BAD_REQUEST,
            Self::Json { .. } => StatusCode::BAD_REQUEST,
            Self::HttpClient { .. } => StatusCode::BAD_GATEWAY,
            Self::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Configuration { .. }
            | Self::Telemetry { .. }
            | Self::Internal { .. }
            | Self::Io { .. }
            | Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Get a string representation of the error type for spans and logs
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::Validation { .. } => "validation_error",
            Self::InvalidCredentials => "invalid_credentials",
            Self::NotFound { .. } => "not_found",
            Self::OutOfStock { .. } => "out_of_stock",
            Self::PaymentDeclined { .. } => "payment_declined",
            Self::Telemetry { .. } => "telemetry_error",
            Self::Internal { .. } => "internal_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Yaml { .. } => "yaml_error",
            Self::HttpClient { .. } => "http_client_error",
            Self::Api { .. } => "api_error",
        }
    }

    /// Message safe to hand back to an API caller.
    ///
    /// Server-side failures never leak their details; the caller gets the
    /// same generic "Server error" the storefront API always answered with.
    pub fn client_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpClient {
            message: err.to_string(),
        }
    }
}

/// Malformed request bodies surface as validation errors on the `body` field
impl From<JsonRejection> for StoreError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            field: "body".to_string(),
            reason: rejection.body_text(),
        }
    }
}

/// Convert errors into the `{ success: false, message }` envelope used by every route
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, error_type = self.error_type(), "Request failed");
        }

        let body = json!({
            "success": false,
            "message": self.client_message(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(StoreError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(StoreError::not_found("Product").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            StoreError::OutOfStock { product: "Leather Ankle Boots".to_string() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StoreError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StoreError::Api { status: 404, message: "Order not found".to_string() }.status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(StoreError::InvalidCredentials.client_message(), "Invalid email or password");
        assert_eq!(StoreError::not_found("Order").client_message(), "Order not found");
        assert_eq!(
            StoreError::OutOfStock { product: "7".to_string() }.client_message(),
            "Product 7 is out of stock"
        );
        // server-side details stay on the server
        assert_eq!(StoreError::internal("lock poisoned").client_message(), "Server error");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(StoreError::validation("items", "Order must contain at least one item").is_client_error());
        assert!(!StoreError::telemetry("exporter unavailable").is_client_error());
        assert_eq!(StoreError::InvalidCredentials.error_type(), "invalid_credentials");
    }
}
