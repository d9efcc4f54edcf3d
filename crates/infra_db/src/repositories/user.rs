//! User repository implementation
//!
//! Emails are unique regardless of case (`users_email_key` on `lower(email)`).

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{StorageError, UserId};
use domain_agreement::{normalize_email, User, UserRepository, UserRole};

use crate::handle::PgHandle;

/// Database row for users
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row
            .role
            .parse()
            .map_err(|e| StorageError::mapping(format!("user {}: {}", row.id, e)))?;
        Ok(User::restore(UserId::from_uuid(row.id), row.email, row.name, role))
    }
}

/// PostgreSQL user repository
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    handle: PgHandle,
}

impl PgUserRepository {
    pub fn new(handle: PgHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn insert(&self, user: &User) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query("INSERT INTO users (id, email, name, role) VALUES ($1, $2, $3, $4)")
                    .bind(*user.id().as_uuid())
                    .bind(user.email())
                    .bind(user.name())
                    .bind(user.role().as_str()),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    async fn update(&self, user: &User) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query("UPDATE users SET email = $2, name = $3, role = $4 WHERE id = $1")
                    .bind(*user.id().as_uuid())
                    .bind(user.email())
                    .bind(user.name())
                    .bind(user.role().as_str()),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), StorageError> {
        self.handle
            .execute(sqlx::query("DELETE FROM users WHERE id = $1").bind(*id.as_uuid()))
            .await?;
        Ok(())
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, StorageError> {
        self.handle
            .fetch_optional(
                sqlx::query_as::<_, UserRow>("SELECT id, email, name, role FROM users WHERE id = $1")
                    .bind(*id.as_uuid()),
            )
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.handle
            .fetch_optional(
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, email, name, role FROM users WHERE lower(email) = $1",
                )
                .bind(normalize_email(email)),
            )
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<User>, StorageError> {
        self.handle
            .fetch_all(sqlx::query_as::<_, UserRow>(
                "SELECT id, email, name, role FROM users ORDER BY email",
            ))
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}
