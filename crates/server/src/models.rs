//! Wire types exchanged with the identity provider and the HTTP API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /add_user`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct AddUserRequest {
    /// Surname followed by one or more given names, separated by whitespace.
    #[schema(example = "Иванов Петр Сергеевич")]
    pub full_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct CredentialRepresentation {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub temporary: bool,
}

impl CredentialRepresentation {
    pub fn temporary_password(value: impl Into<String>) -> Self {
        Self {
            kind: "password".to_string(),
            value: value.into(),
            temporary: true,
        }
    }
}

/// User as understood by the admin API. Unknown fields are ignored on read.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    pub username: String,
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<CredentialRepresentation>,
}

impl UserRepresentation {
    /// Copy without credential values, safe to hand back to API callers.
    pub fn without_credentials(&self) -> Self {
        Self {
            credentials: Vec::new(),
            ..self.clone()
        }
    }
}

/// Token endpoint response for both the password and refresh grants.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RealmStatus {
    Created,
    AlreadyExists,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct RealmOutcome {
    pub realm: String,
    pub status: RealmStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRepresentation>,
}

/// Result of provisioning one person into every configured realm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProvisioningReport {
    pub username: String,
    pub realms: Vec<RealmOutcome>,
}

impl ProvisioningReport {
    pub fn created(&self) -> impl Iterator<Item = &RealmOutcome> {
        self.realms
            .iter()
            .filter(|r| r.status == RealmStatus::Created)
    }
}
