use axum::{
    response::{IntoResponse, Json, Response},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Result envelope returned by every form endpoint: `{status, message, data}`.
///
/// `status == 0` is success; the amis front-end reads `data` only in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOut<T: Serialize> {
    pub status: i32,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiOut<T> {
    /// Create a successful envelope
    pub fn success(data: T) -> Self {
        Self {
            status: 0,
            message: "success".to_string(),
            data,
        }
    }

    /// Replace the message shown by the front-end toast
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for ApiOut<Value> {
    fn default() -> Self {
        Self::success(Value::Null)
    }
}

impl<T: Serialize> IntoResponse for ApiOut<T> {
    fn into_response(self) -> Response {
        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": 500,
                        "message": "Failed to serialize response data",
                        "data": null
                    }))
                ).into_response();
            }
        };

        let envelope = json!({
            "status": self.status,
            "message": self.message,
            "data": data_value
        });

        (StatusCode::OK, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiOut<T>, crate::error::ApiError>;
