//! Client for the identity provider's admin API.
//!
//! [`IdentityClient`] owns the admin principal and the admin token pair. Every
//! authenticated call goes through [`IdentityClient::ensure_valid_token`], which
//! reuses, refreshes or re-acquires the token as needed. The token state sits behind
//! a single async mutex, so concurrent requests never race on a refresh.

pub mod credentials;
pub mod token;
pub mod translit;
pub mod users;

pub use credentials::{Credentials, PersonName, derive_credentials};
pub use token::{TokenAction, TokenState};
pub use users::{find_user_by_patronymic, user_query};

use crate::config::{KeycloakConfig, ProvisioningConfig};
use crate::error::IdentityError;
use crate::http::{RequestHelper, is_failure};
use crate::models::TokenResponse;
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;

const TOKEN_ENDPOINT: &str = "/realms/master/protocol/openid-connect/token";

pub struct IdentityClient {
    host: String,
    username: String,
    password: SecretString,
    client_id: String,
    realms: Vec<String>,
    provisioning: ProvisioningConfig,
    requester: RequestHelper,
    token: Mutex<TokenState>,
}

impl IdentityClient {
    pub fn new(
        keycloak: &KeycloakConfig,
        provisioning: &ProvisioningConfig,
    ) -> Result<Self, IdentityError> {
        let requester = RequestHelper::new(Duration::from_secs(keycloak.request_timeout_secs))?;
        Ok(Self::with_requester(keycloak, provisioning, requester))
    }

    pub fn with_requester(
        keycloak: &KeycloakConfig,
        provisioning: &ProvisioningConfig,
        requester: RequestHelper,
    ) -> Self {
        Self {
            host: keycloak.host.trim().trim_end_matches('/').to_string(),
            username: keycloak.username.clone(),
            password: SecretString::from(keycloak.password.clone()),
            client_id: keycloak.client_id.clone(),
            realms: keycloak.realms.clone(),
            provisioning: provisioning.clone(),
            requester,
            token: Mutex::new(TokenState::new(OffsetDateTime::now_utc())),
        }
    }

    pub fn realms(&self) -> &[String] {
        &self.realms
    }

    pub fn provisioning(&self) -> &ProvisioningConfig {
        &self.provisioning
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// Log in with the admin username and password, replacing all token state.
    #[tracing::instrument(skip(self), fields(username = %self.username))]
    pub async fn acquire_primary_token(&self) -> Result<(), IdentityError> {
        let mut state = self.token.lock().await;
        self.login(&mut state).await
    }

    /// Exchange the held refresh token for a new access token.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<(), IdentityError> {
        let mut state = self.token.lock().await;
        self.refresh(&mut state).await
    }

    /// Make sure the held access token is usable and return it.
    ///
    /// The lock is held across any network exchange so a single refresh serves all
    /// callers waiting on it.
    pub async fn ensure_valid_token(&self) -> Result<String, IdentityError> {
        let mut state = self.token.lock().await;
        match state.next_action(OffsetDateTime::now_utc()) {
            TokenAction::UseCurrent => {}
            TokenAction::Refresh => self.refresh(&mut state).await?,
            TokenAction::Reauthenticate => self.login(&mut state).await?,
        }
        state
            .bearer()
            .ok_or_else(|| IdentityError::Decode("token endpoint returned no access token".into()))
    }

    async fn login(&self, state: &mut TokenState) -> Result<(), IdentityError> {
        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.expose_secret()),
            ("client_id", self.client_id.as_str()),
            ("grant_type", "password"),
        ];
        let acquired_at = OffsetDateTime::now_utc();
        let token = self.exchange(&form).await?;
        state.apply_login(acquired_at, token)?;
        tracing::info!(
            name = "identity.token.login",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            access_expiry = %state.access_token_expiry(),
            refresh_expiry = %state.refresh_token_expiry(),
            message = "Obtained admin token"
        );
        Ok(())
    }

    async fn refresh(&self, state: &mut TokenState) -> Result<(), IdentityError> {
        let Some(refresh_token) = state.refresh_token().map(|t| t.expose_secret().to_string())
        else {
            return self.login(state).await;
        };
        let form = [
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let acquired_at = OffsetDateTime::now_utc();
        let token = self.exchange(&form).await?;
        state.apply_refresh(acquired_at, token)?;
        tracing::debug!(
            name = "identity.token.refresh",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            access_expiry = %state.access_token_expiry(),
            message = "Refreshed admin access token"
        );
        Ok(())
    }

    async fn exchange(&self, form: &[(&str, &str)]) -> Result<TokenResponse, IdentityError> {
        let response = self
            .requester
            .post(&self.url(TOKEN_ENDPOINT), |b| b.form(form))
            .await?;
        if is_failure(response.status()) {
            let (status, body) = rejection(response).await;
            tracing::error!(
                name = "identity.token.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                status = %status,
                body = %body,
                message = "Error getting token"
            );
            return Err(IdentityError::Authentication { status, body });
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}

/// Status and body text of a rejected call.
async fn rejection(response: Response) -> (reqwest::StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}
