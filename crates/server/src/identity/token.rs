//! Admin token state and the decision of when to refresh it.

use crate::error::IdentityError;
use crate::models::TokenResponse;
use secrecy::{ExposeSecret, SecretString};
use time::{Duration, OffsetDateTime};

/// What has to happen before the next authenticated call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenAction {
    /// The access token is still valid.
    UseCurrent,
    /// Access token expired, refresh token still valid.
    Refresh,
    /// Both expired (or nothing held yet): log in with the admin password again.
    Reauthenticate,
}

pub struct TokenState {
    access_token: Option<SecretString>,
    access_token_expiry: OffsetDateTime,
    refresh_token: Option<SecretString>,
    refresh_token_expiry: OffsetDateTime,
}

impl TokenState {
    /// Empty state with both deadlines at `now`, forcing a login on first use.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            access_token: None,
            access_token_expiry: now,
            refresh_token: None,
            refresh_token_expiry: now,
        }
    }

    pub fn next_action(&self, now: OffsetDateTime) -> TokenAction {
        if self.access_token.is_some() && now < self.access_token_expiry {
            return TokenAction::UseCurrent;
        }
        if self.refresh_token.is_none() || self.refresh_token_expiry <= now {
            return TokenAction::Reauthenticate;
        }
        TokenAction::Refresh
    }

    /// Store the result of a password grant. All four fields are replaced.
    ///
    /// The refresh deadline uses `refresh_expires_in` when the provider sends it and
    /// falls back to the access token lifetime otherwise. A lifetime that is negative
    /// or out of range leaves the state untouched.
    pub fn apply_login(
        &mut self,
        acquired_at: OffsetDateTime,
        token: TokenResponse,
    ) -> Result<(), IdentityError> {
        let refresh_lifetime = token.refresh_expires_in.unwrap_or(token.expires_in);
        let access_expiry = deadline(acquired_at, token.expires_in)?;
        let refresh_expiry = deadline(acquired_at, refresh_lifetime)?;
        self.access_token = Some(SecretString::from(token.access_token));
        self.access_token_expiry = access_expiry;
        self.refresh_token = token.refresh_token.map(SecretString::from);
        self.refresh_token_expiry = refresh_expiry;
        Ok(())
    }

    /// Store the result of a refresh grant. The refresh token and its deadline stay.
    pub fn apply_refresh(
        &mut self,
        acquired_at: OffsetDateTime,
        token: TokenResponse,
    ) -> Result<(), IdentityError> {
        self.access_token_expiry = deadline(acquired_at, token.expires_in)?;
        self.access_token = Some(SecretString::from(token.access_token));
        Ok(())
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    pub fn access_token_expiry(&self) -> OffsetDateTime {
        self.access_token_expiry
    }

    pub fn refresh_token_expiry(&self) -> OffsetDateTime {
        self.refresh_token_expiry
    }

    /// Bearer value for the `Authorization` header.
    pub fn bearer(&self) -> Option<String> {
        self.access_token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
    }
}

fn deadline(
    acquired_at: OffsetDateTime,
    lifetime_secs: i64,
) -> Result<OffsetDateTime, IdentityError> {
    if lifetime_secs < 0 {
        return Err(IdentityError::Decode(format!(
            "negative token lifetime: {lifetime_secs}s"
        )));
    }
    acquired_at
        .checked_add(Duration::seconds(lifetime_secs))
        .ok_or_else(|| {
            IdentityError::Decode(format!("token lifetime out of range: {lifetime_secs}s"))
        })
}

impl std::fmt::Debug for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenState")
            .field("has_access_token", &self.access_token.is_some())
            .field("access_token_expiry", &self.access_token_expiry)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}
