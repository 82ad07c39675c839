use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::claims::Claims;
use super::directory::UserDirectory;
use super::errors::AuthError;
use super::jwt::{JwtKeys, TokenError};
use super::password::{PasswordError, PasswordHasher};
use super::repo_types::{NewUser, PublicUser};

/// Registration, login, profile lookup and token authentication over an
/// injected user directory.
#[derive(Clone)]
pub struct AccountService {
    directory: Arc<dyn UserDirectory>,
    hasher: PasswordHasher,
    keys: Arc<JwtKeys>,
}

impl AccountService {
    pub fn new(directory: Arc<dyn UserDirectory>, hasher: PasswordHasher, keys: Arc<JwtKeys>) -> Self {
        Self {
            directory,
            hasher,
            keys,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<PublicUser, AuthError> {
        if self.directory.exists_by_email(email).await? {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hash(password.to_owned()).await?;

        // A concurrent registration can still win the insert; the store's
        // unique constraint turns that into DuplicateEmail as well.
        let user = self
            .directory
            .create(NewUser {
                email: email.to_owned(),
                username: username.to_owned(),
                password_hash,
                is_active: true,
            })
            .await?;

        Ok(user.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, PublicUser), AuthError> {
        let user = match self.directory.find_by_email(email).await? {
            Some(u) => u,
            None => {
                self.check(password.to_owned(), None).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self
            .check(password.to_owned(), Some(user.password_hash.clone()))
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue(user.id, &user.username, &user.email)
            .map_err(AuthError::Signing)?;

        Ok((token, user.into()))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<PublicUser, AuthError> {
        self.directory
            .find_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::NotFound)
    }

    pub fn token_ttl(&self) -> Duration {
        self.keys.ttl()
    }

    /// Validates a bearer token. Pure computation, no directory access.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        self.keys.validate(token).map_err(|e| match e {
            TokenError::Signing(_) => AuthError::Signing(e),
            _ => AuthError::InvalidToken(e),
        })
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .map_err(AuthError::from)
    }

    /// Verifies off the async runtime. `None` runs the decoy check so unknown
    /// emails cost the same as wrong passwords.
    async fn check(&self, password: String, digest: Option<String>) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || match digest {
            Some(d) => hasher.verify(&password, &d),
            None => hasher.verify_decoy(&password),
        })
        .await
        .map_err(|e| AuthError::Hashing(PasswordError::Hash(e.to_string())))
    }
}
