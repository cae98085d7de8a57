//! Error rendering and body conversions for the API.
//!
//! # Design Decisions
//! - Every error body has the shape `{"status": "error", "message": ...}`
//! - The status code comes from `MutationError::status_code()`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::coordinator::OperationResult;
use crate::error::MutationError;

impl IntoResponse for MutationError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(OperationResult::error(self.to_string()))).into_response()
    }
}

/// Error response naming the rule file the request was about.
pub fn error_with_file(err: MutationError, file: impl Into<String>) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = OperationResult::error(err.to_string()).with_file(file);
    (status, Json(body)).into_response()
}

/// Convert a JSON request body into a YAML value.
pub fn json_to_yaml(value: &serde_json::Value) -> Result<serde_yaml::Value, MutationError> {
    serde_yaml::to_value(value).map_err(|e| MutationError::Validation(format!("invalid payload: {e}")))
}

/// Convert a YAML configuration value into JSON for a response.
pub fn yaml_to_json(value: &serde_yaml::Value) -> Result<serde_json::Value, MutationError> {
    serde_json::to_value(value).map_err(|e| MutationError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = MutationError::NotFound("File not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"status": "error", "message": "File not found"}));
    }

    #[tokio::test]
    async fn test_error_with_file() {
        let err = MutationError::ReloadFailed { status: 500, message: "bad rules".into() };
        let response = error_with_file(err, "r.yml");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "bad rules", "file": "r.yml"})
        );
    }

    #[test]
    fn test_conversions() {
        let json = serde_json::json!({"scrape_interval": "15s", "external_labels": {"env": "prod"}});
        let yaml = json_to_yaml(&json).unwrap();
        assert_eq!(yaml["external_labels"]["env"], serde_yaml::Value::from("prod"));
        assert_eq!(yaml_to_json(&yaml).unwrap(), json);
    }
}
