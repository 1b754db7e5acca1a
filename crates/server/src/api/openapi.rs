//! OpenAPI/Utoipa configuration.

use crate::api::{health::MISC_TAG, users::USERS_TAG};
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keycloak Provisioner API",
        version = "1.0.0",
        description = "Creates identity provider accounts from a person's full name."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = USERS_TAG, description = "User provisioning endpoints")
    )
)]
pub struct ApiDoc;
