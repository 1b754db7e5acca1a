//! Login name, password and email derivation from a person's full name.

use super::translit::transliterate;
use crate::error::IdentityError;
use base64::Engine;

/// A full name split into surname and given names.
///
/// Only built through [`PersonName::parse`], so there is always a first name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonName {
    surname: String,
    /// First name followed by any further names (patronymic, middle names).
    given_names: Vec<String>,
}

impl PersonName {
    /// Split on whitespace. At least a surname and a first name are required.
    pub fn parse(full_name: &str) -> Result<Self, IdentityError> {
        let mut parts = full_name.split_whitespace().map(str::to_string);
        let surname = parts.next();
        let given_names: Vec<String> = parts.collect();
        match surname {
            Some(surname) if !given_names.is_empty() => Ok(Self {
                surname,
                given_names,
            }),
            _ => Err(IdentityError::InvalidFullName(full_name.to_string())),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.given_names[0]
    }

    pub fn last_name(&self) -> &str {
        &self.surname
    }

    pub fn given_names(&self) -> &[String] {
        &self.given_names
    }

    /// `surname.initials`, transliterated.
    pub fn username(&self) -> String {
        let mut username = transliterate(&self.surname);
        username.push('.');
        for name in &self.given_names {
            if let Some(initial) = name.chars().next() {
                username.push_str(&transliterate(initial.encode_utf8(&mut [0; 4])));
            }
        }
        username
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub name: PersonName,
    pub username: String,
    /// Predictable `<username>123` password. Only used with legacy passwords enabled.
    pub password: String,
    pub email: String,
}

pub fn derive_credentials(
    full_name: &str,
    email_domain: &str,
) -> Result<Credentials, IdentityError> {
    let name = PersonName::parse(full_name)?;
    let username = name.username();
    Ok(Credentials {
        password: format!("{username}123"),
        email: format!("{username}@{email_domain}"),
        username,
        name,
    })
}

/// Random temporary password, 128 bits of entropy encoded URL-safe.
pub fn generate_password() -> String {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes).expect("Failed to generate random bytes");
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
