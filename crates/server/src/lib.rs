//! Provisioning bridge for a Keycloak-style identity provider.
//!
//! Authenticates against the admin API, keeps the admin token pair fresh, and creates
//! user accounts across a configured list of realms. Login names, emails and
//! temporary passwords are derived from a person's full name.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::identity::IdentityClient;

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod logging;
pub mod models;

#[derive(Clone)]
pub struct AppResources {
    pub config: Arc<AppConfig>,
    pub identity: Arc<IdentityClient>,
}

impl AppResources {
    /// Build the identity client from `config`.
    pub fn from_config(config: AppConfig) -> Result<Self, error::IdentityError> {
        let identity = IdentityClient::new(&config.keycloak, &config.provisioning)?;
        Ok(Self {
            config: Arc::new(config),
            identity: Arc::new(identity),
        })
    }
}
