//! User lookup and provisioning across realms.

use super::{IdentityClient, credentials::generate_password, derive_credentials, rejection};
use crate::error::IdentityError;
use crate::http::is_failure;
use crate::models::{
    CredentialRepresentation, ProvisioningReport, RealmOutcome, RealmStatus, UserRepresentation,
};
use serde_json::Value;

/// Query string for a user search: `?k=v&k2=v2` with values percent-encoded.
/// Empty when there are no filters.
pub fn user_query(filters: &[(&str, &str)]) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = filters
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    format!("?{}", pairs.join("&"))
}

/// First user whose `SECOND_NAME` equals `patronymic` (case-insensitive) and whose
/// `ID` is not in `except_ids`.
pub fn find_user_by_patronymic<'a>(
    users: &'a [Value],
    patronymic: &str,
    except_ids: &[&str],
) -> Option<&'a Value> {
    let wanted = patronymic.to_lowercase();
    users.iter().find(|user| {
        let matches_name = user
            .get("SECOND_NAME")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.is_empty() && name.to_lowercase() == wanted);
        let excluded = user
            .get("ID")
            .and_then(Value::as_str)
            .is_some_and(|id| except_ids.contains(&id));
        matches_name && !excluded
    })
}

enum RealmResult {
    Existing,
    Created(UserRepresentation),
}

impl IdentityClient {
    /// Search users in `realm`.
    #[tracing::instrument(skip(self))]
    pub async fn lookup_user(
        &self,
        realm: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<UserRepresentation>, IdentityError> {
        let token = self.ensure_valid_token().await?;
        let url = format!(
            "{}{}",
            self.url(&format!("/admin/realms/{realm}/users")),
            user_query(filters)
        );
        let response = self.requester.get(&url, |b| b.bearer_auth(&token)).await?;
        if is_failure(response.status()) {
            let (status, body) = rejection(response).await;
            tracing::error!(
                name = "identity.lookup.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                realm = %realm,
                status = %status,
                body = %body,
                message = "Error getting user"
            );
            return Err(IdentityError::Lookup { status, body });
        }
        Ok(response.json::<Vec<UserRepresentation>>().await?)
    }

    /// The user named exactly `username` in `realm`, if any.
    ///
    /// The admin API treats `username` as a substring search, so results are filtered.
    pub async fn find_user_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> Result<Option<UserRepresentation>, IdentityError> {
        let users = self.lookup_user(realm, &[("username", username)]).await?;
        Ok(users
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(username)))
    }

    /// Create `user` in `realm` and return the stored representation.
    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(
        &self,
        realm: &str,
        user: &UserRepresentation,
    ) -> Result<UserRepresentation, IdentityError> {
        let token = self.ensure_valid_token().await?;
        let url = self.url(&format!("/admin/realms/{realm}/users"));
        let response = self
            .requester
            .post(&url, |b| b.bearer_auth(&token).json(user))
            .await?;
        if is_failure(response.status()) {
            let (status, body) = rejection(response).await;
            tracing::error!(
                name = "identity.create_user.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                realm = %realm,
                status = %status,
                body = %body,
                message = "Error creating user"
            );
            return Err(IdentityError::Provisioning { status, body });
        }

        let body = response.text().await?;
        if !body.trim().is_empty() {
            return serde_json::from_str(&body).map_err(|e| IdentityError::Decode(e.to_string()));
        }
        // The admin API answers 201 with an empty body and a Location header.
        let stored = self.find_user_by_username(realm, &user.username).await?;
        Ok(stored.unwrap_or_else(|| user.without_credentials()))
    }

    /// Provision the person named `full_name` into the first configured realm only.
    ///
    /// Returns `None` when the user already exists there or no realm is configured.
    pub async fn provision_user(
        &self,
        full_name: &str,
    ) -> Result<Option<UserRepresentation>, IdentityError> {
        let (username, user) = self.new_user(full_name)?;
        self.ensure_valid_token().await?;

        let Some(realm) = self.realms.first() else {
            return Ok(None);
        };
        match self.provision_into(realm, &username, &user).await? {
            RealmResult::Existing => Ok(None),
            RealmResult::Created(created) => Ok(Some(created)),
        }
    }

    /// Provision the person named `full_name` into every configured realm, in order.
    ///
    /// Realms that already hold the username are reported and left alone. The first
    /// error aborts the run.
    pub async fn provision_user_in_all_realms(
        &self,
        full_name: &str,
    ) -> Result<ProvisioningReport, IdentityError> {
        let (username, user) = self.new_user(full_name)?;
        self.ensure_valid_token().await?;

        let mut realms = Vec::with_capacity(self.realms.len());
        for realm in &self.realms {
            let outcome = match self.provision_into(realm, &username, &user).await? {
                RealmResult::Existing => RealmOutcome {
                    realm: realm.clone(),
                    status: RealmStatus::AlreadyExists,
                    user: None,
                },
                RealmResult::Created(created) => RealmOutcome {
                    realm: realm.clone(),
                    status: RealmStatus::Created,
                    user: Some(created),
                },
            };
            realms.push(outcome);
        }
        Ok(ProvisioningReport { username, realms })
    }

    async fn provision_into(
        &self,
        realm: &str,
        username: &str,
        user: &UserRepresentation,
    ) -> Result<RealmResult, IdentityError> {
        if self.find_user_by_username(realm, username).await?.is_some() {
            tracing::debug!(
                name = "identity.provision.exists",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                realm = %realm,
                username = %username,
                message = "User already exists in realm"
            );
            return Ok(RealmResult::Existing);
        }

        tracing::info!(
            name = "identity.provision.create",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            realm = %realm,
            username = %username,
            message = "Creating new user"
        );
        let mut created = self.create_user(realm, user).await?;
        // Hand the temporary password back so it can be passed on to the person.
        created.credentials = user.credentials.clone();
        Ok(RealmResult::Created(created))
    }

    /// Representation to submit for `full_name`, with its temporary password.
    fn new_user(&self, full_name: &str) -> Result<(String, UserRepresentation), IdentityError> {
        let creds = derive_credentials(full_name, &self.provisioning.email_domain)?;
        let password = if self.provisioning.legacy_passwords {
            creds.password.clone()
        } else {
            generate_password()
        };
        let user = UserRepresentation {
            id: None,
            enabled: true,
            username: creds.username.clone(),
            first_name: Some(creds.name.first_name().to_string()),
            last_name: Some(creds.name.last_name().to_string()),
            email: Some(creds.email.clone()),
            credentials: vec![CredentialRepresentation::temporary_password(password)],
        };
        Ok((creds.username, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_filter_has_no_trailing_separator() {
        assert_eq!(user_query(&[("username", "ivanov.p")]), "?username=ivanov.p");
    }

    #[test]
    fn multiple_filters_are_joined() {
        assert_eq!(
            user_query(&[("username", "ivanov.p"), ("max", "5")]),
            "?username=ivanov.p&max=5"
        );
    }

    #[test]
    fn no_filters_no_query() {
        assert_eq!(user_query(&[]), "");
    }

    #[test]
    fn values_are_percent_encoded() {
        assert_eq!(
            user_query(&[("search", "a&b=c d")]),
            "?search=a%26b%3Dc%20d"
        );
        assert_eq!(
            user_query(&[("lastName", "Иванов")]),
            "?lastName=%D0%98%D0%B2%D0%B0%D0%BD%D0%BE%D0%B2"
        );
    }

    #[test]
    fn patronymic_lookup_skips_excluded_ids() {
        let users = vec![
            json!({"ID": "1", "SECOND_NAME": "Петрович"}),
            json!({"ID": "2", "SECOND_NAME": "петрович"}),
            json!({"ID": "3"}),
        ];
        let found = find_user_by_patronymic(&users, "ПЕТРОВИЧ", &[]).unwrap();
        assert_eq!(found["ID"], "1");

        let found = find_user_by_patronymic(&users, "Петрович", &["1"]).unwrap();
        assert_eq!(found["ID"], "2");

        assert!(find_user_by_patronymic(&users, "Петрович", &["1", "2"]).is_none());
        assert!(find_user_by_patronymic(&users, "Ивановна", &[]).is_none());
    }
}
