use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Authentication against identity provider failed with HTTP {status}: {body}")]
    Authentication { status: StatusCode, body: String },
    #[error("User lookup failed with HTTP {status}: {body}")]
    Lookup { status: StatusCode, body: String },
    #[error("User provisioning failed with HTTP {status}: {body}")]
    Provisioning { status: StatusCode, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid response body: {0}")]
    Decode(String),
    #[error("Invalid full name {0:?}: expected at least a surname and a given name")]
    InvalidFullName(String),
}

impl IdentityError {
    /// Status code reported by the identity provider, if the failure came from one.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            IdentityError::Authentication { status, .. }
            | IdentityError::Lookup { status, .. }
            | IdentityError::Provisioning { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            IdentityError::Decode(e.to_string())
        } else {
            IdentityError::Transport(e.to_string())
        }
    }
}
