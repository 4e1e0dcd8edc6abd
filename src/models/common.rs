use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Success envelope: `{"success": true, "data": ..., "message"?: ...}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body produced by `AppError`, documented for the OpenAPI schema
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let body = serde_json::to_value(ApiResponse::success(json!({"count": 2}))).unwrap();
        assert_eq!(body, json!({"success": true, "data": {"count": 2}}));
    }

    #[test]
    fn test_message_envelope() {
        let body = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(body, json!({"success": true, "message": "done"}));
    }
}
