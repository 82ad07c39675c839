use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::directory::{DirectoryError, UserDirectory};
use super::repo_types::{NewUser, User};

const USER_COLUMNS: &str =
    "id, email, username, password_hash, is_active, created_at, updated_at, deleted_at";

/// Postgres-backed user directory.
#[derive(Clone)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn store_error(e: sqlx::Error) -> DirectoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => DirectoryError::Duplicate,
        _ => DirectoryError::Store(Box::new(e)),
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    /// Insert a user; id and timestamps come from column defaults.
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, username, password_hash, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .fetch_one(&self.db)
            .await
            .map_err(store_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(store_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(store_error)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DirectoryError> {
        let (exists,): (bool,) =
            sqlx::query_as(r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)"#)
                .bind(email)
                .fetch_one(&self.db)
                .await
                .map_err(store_error)?;
        Ok(exists)
    }
}
