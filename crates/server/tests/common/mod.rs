//! Shared fixtures: a mocked identity provider and clients pointed at it.

#![allow(dead_code)]

use keycloak_provisioner::{
    config::{AppConfig, KeycloakConfig, ProvisioningConfig, ProvisioningMode},
    identity::IdentityClient,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

pub const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";

pub fn users_path(realm: &str) -> String {
    format!("/admin/realms/{realm}/users")
}

pub fn token_body(access: &str, expires_in: i64, refresh_expires_in: Option<i64>) -> Value {
    let mut body = json!({
        "access_token": access,
        "refresh_token": "refresh-1",
        "expires_in": expires_in,
        "token_type": "Bearer"
    });
    if let Some(r) = refresh_expires_in {
        body["refresh_expires_in"] = json!(r);
    }
    body
}

/// Password grant answering with a five minute token, expected `times` times.
pub async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("access-1", 300, Some(1800))),
        )
        .expect(times)
        .mount(server)
        .await;
}

pub fn app_config(
    server: &MockServer,
    realms: &[&str],
    mode: ProvisioningMode,
    legacy_passwords: bool,
) -> AppConfig {
    AppConfig {
        keycloak: KeycloakConfig {
            host: server.uri(),
            username: "admin".into(),
            password: "admin-secret".into(),
            realms: realms.iter().map(|r| r.to_string()).collect(),
            client_id: "admin-cli".into(),
            request_timeout_secs: 5,
        },
        provisioning: ProvisioningConfig {
            mode,
            email_domain: "kgeu.ru".into(),
            legacy_passwords,
        },
        ..AppConfig::default()
    }
}

pub fn client(
    server: &MockServer,
    realms: &[&str],
    mode: ProvisioningMode,
    legacy_passwords: bool,
) -> IdentityClient {
    let config = app_config(server, realms, mode, legacy_passwords);
    IdentityClient::new(&config.keycloak, &config.provisioning).expect("build identity client")
}
