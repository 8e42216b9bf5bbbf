// HTTP API Error Types
use axum::{response::IntoResponse, http::StatusCode, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // 422 Unprocessable Entity (well-formed JSON that fails the form schema)
    ValidationError {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::ValidationError { .. } => 422,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to the result envelope the front-end expects.
    /// A non-zero `status` tells amis to show `message` instead of using `data`.
    pub fn to_json(&self) -> Value {
        let mut data = json!({ "code": self.error_code() });
        if let ApiError::ValidationError { field_errors, .. } = self {
            data["field_errors"] = json!(field_errors);
        }

        json!({
            "status": self.status_code(),
            "message": self.message(),
            "data": data
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: BTreeMap<String, String>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_json(format!("Request body is not valid JSON: {}", err))
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        // Template failures are a server bug, not something to show the client
        tracing::error!("Page template error: {}", err);
        ApiError::internal_server_error("Failed to render page")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

/// Schema definition problems, detected when a schema is compiled
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("field name must not be empty")]
    EmptyFieldName,

    #[error("duplicate field: {0}")]
    DuplicateField(String),

    #[error("select field '{0}' has no options")]
    EmptyOptions(String),

    #[error("default for field '{field}' does not match its type: {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("failed to compile JSON schema: {0}")]
    Compile(String),

    #[error("failed to parse schema definition: {0}")]
    Parse(String),
}

/// Developer-facing configuration errors raised while registering or
/// materializing admins. These never reach end users.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{admin}: schema is None")]
    MissingSchema { admin: String },

    #[error("{admin}: invalid schema: {source}")]
    InvalidSchema {
        admin: String,
        #[source]
        source: SchemaError,
    },

    #[error("{0} is not registered with the site")]
    NotRegistered(String),

    #[error("{admin}: invalid path '{path}' (must start with '/')")]
    InvalidPath { admin: String, path: String },

    #[error("route {method} {path} is claimed by both {first} and {second}")]
    DuplicateRoute {
        method: &'static str,
        path: String,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_envelope_carries_field_errors() {
        let mut fields = BTreeMap::new();
        fields.insert("username".to_string(), "This field is required".to_string());
        let err = ApiError::validation_error("Invalid form data", fields);

        assert_eq!(err.status_code(), 422);
        let body = err.to_json();
        assert_eq!(body["status"], 422);
        assert_eq!(body["message"], "Invalid form data");
        assert_eq!(body["data"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["data"]["field_errors"]["username"], "This field is required");
    }

    #[test]
    fn plain_errors_omit_field_errors() {
        let body = ApiError::invalid_json("bad body").to_json();
        assert_eq!(body["status"], 400);
        assert!(body["data"].get("field_errors").is_none());
    }

    #[test]
    fn missing_schema_message() {
        let err = ConfigError::MissingSchema { admin: "LoginAdmin".into() };
        assert!(err.to_string().contains("schema is None"));
    }
}
