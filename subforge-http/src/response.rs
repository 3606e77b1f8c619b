use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use subforge::error::ErrorResponse;

/// Body of every 2xx API response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Wrap `data` in the API envelope. 4xx/5xx statuses produce the error
/// shape with `data` moved under `errors`.
pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: Option<T>) -> Response {
    if status.is_client_error() || status.is_server_error() {
        let errors = data.and_then(|d| serde_json::to_value(d).ok());
        let body = ErrorResponse {
            success: false,
            message: message.to_string(),
            errors,
        };
        return (status, Json(body)).into_response();
    }

    let body = SuccessResponse {
        success: true,
        message: message.to_string(),
        data,
    };
    (status, Json(body)).into_response()
}

pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    respond(status, message, Some(data))
}

pub fn message(status: StatusCode, message: &str) -> Response {
    respond::<()>(status, message, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_uses_error_envelope() {
        let response = respond(
            StatusCode::SERVICE_UNAVAILABLE,
            "down",
            Some(serde_json::json!({"isConnected": false})),
        );
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_message_only_omits_data() {
        let body = SuccessResponse::<()> {
            success: true,
            message: "User deleted successfully".into(),
            data: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "message": "User deleted successfully"})
        );
    }
}
