//! User provisioning endpoint.

use crate::AppResources;
use crate::api::error::ApiError;
use crate::config::ProvisioningMode;
use crate::models::{AddUserRequest, ProvisioningReport, UserRepresentation};
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const USERS_TAG: &str = "Users";

/// Body returned by `POST /add_user`, depending on the configured provisioning mode.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AddUserResponse {
    /// `all_realms`: per-realm outcome.
    Report(ProvisioningReport),
    /// `first_realm`: the created user, or `null` when it already existed.
    User(Option<UserRepresentation>),
}

/// Creates the users API router.
pub fn router(resources: AppResources) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(add_user))
        .with_state(resources)
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    post,
    path = "/add_user",
    request_body = AddUserRequest,
    tag = USERS_TAG,
    operation_id = "Add User",
    summary = "Provision a user from a full name",
    description = "Derives username, email and a temporary password from the full name and \
                   creates the account in the configured realms. Realms that already contain \
                   the username are skipped.",
    responses(
        (status = 200, description = "Provisioning finished. In `first_realm` mode the body is \
                                      the created user or `null`.",
         body = ProvisioningReport, content_type = "application/json"),
        (status = 400, description = "Full name has fewer than two parts"),
        (status = 409, description = "Identity provider reported a conflicting user"),
        (status = 502, description = "Identity provider rejected a call"),
        (status = 503, description = "Identity provider unreachable")
    )
)]
pub async fn add_user(
    State(resources): State<AppResources>,
    Json(request): Json<AddUserRequest>,
) -> Result<Json<AddUserResponse>, ApiError> {
    let identity = &resources.identity;
    let mode = identity.provisioning().mode;
    tracing::info!(
        name = "api.add_user",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        full_name = %request.full_name,
        mode = ?mode,
        message = "Received user creation request"
    );

    let response = match mode {
        ProvisioningMode::AllRealms => AddUserResponse::Report(
            identity
                .provision_user_in_all_realms(&request.full_name)
                .await?,
        ),
        ProvisioningMode::FirstRealm => {
            AddUserResponse::User(identity.provision_user(&request.full_name).await?)
        }
    };
    Ok(Json(response))
}
