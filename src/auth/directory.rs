use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUser, User};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Insert hit the store's uniqueness constraint on email.
    #[error("email already registered")]
    Duplicate,
    #[error("user store failure")]
    Store(#[source] BoxError),
}

/// Storage of user records. Lookups return `Ok(None)` when nothing matches.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, DirectoryError>;
}
