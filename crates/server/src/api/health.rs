//! Liveness endpoints.

use axum::Json;
use serde_json::{Value, json};

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

/// Sanity check kept for existing clients.
#[tracing::instrument()]
#[utoipa::path(
    get,
    path = "/",
    tag = MISC_TAG,
    operation_id = "Root",
    summary = "Sanity response",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

/// Health check endpoint.
#[tracing::instrument()]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Service health check",
    description = "Returns a simple health status indicating the service is running and \
                   accepting requests.\n\nDoes not contact the identity provider.",
    responses(
        (status = 200, description = "Service is healthy", body = str,
         content_type = "text/plain", example = "ok")
    )
)]
pub async fn health() -> &'static str {
    "ok"
}
