use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use super::directory::{DirectoryError, UserDirectory};
use super::repo_types::{NewUser, User};

/// In-memory user directory with the same uniqueness rule as the users
/// table.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DirectoryError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DirectoryError> {
        Ok(self.users.read().iter().any(|u| u.email == email))
    }
}
