//! Mapping of client errors onto HTTP responses.

use crate::error::IdentityError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub IdentityError);

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            IdentityError::InvalidFullName(_) => StatusCode::BAD_REQUEST,
            IdentityError::Provisioning { status, .. } if status.as_u16() == 409 => {
                StatusCode::CONFLICT
            }
            IdentityError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            IdentityError::Authentication { .. }
            | IdentityError::Lookup { .. }
            | IdentityError::Provisioning { .. }
            | IdentityError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({ "error": self.0.to_string() });
        if let Some(upstream) = self.0.upstream_status() {
            body["upstream_status"] = json!(upstream.as_u16());
        }
        (status, Json(body)).into_response()
    }
}
