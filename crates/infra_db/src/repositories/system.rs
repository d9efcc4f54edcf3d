//! System repository implementation

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{StorageError, SystemId};
use domain_agreement::{System, SystemRepository};

use crate::handle::PgHandle;

/// Database row for systems
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SystemRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub application_id: String,
    pub users: i32,
}

impl From<SystemRow> for System {
    fn from(row: SystemRow) -> Self {
        System::restore(
            SystemId::from_uuid(row.id),
            row.name,
            row.description,
            row.application_id,
            row.users,
        )
    }
}

/// PostgreSQL system repository
#[derive(Debug, Clone)]
pub struct PgSystemRepository {
    handle: PgHandle,
}

impl PgSystemRepository {
    pub fn new(handle: PgHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl SystemRepository for PgSystemRepository {
    #[instrument(skip(self, system), fields(system_id = %system.id()))]
    async fn insert(&self, system: &System) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query(
                    r#"
                    INSERT INTO systems (id, name, description, application_id, users)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(*system.id().as_uuid())
                .bind(system.name())
                .bind(system.description())
                .bind(system.application_id())
                .bind(system.users()),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, system), fields(system_id = %system.id()))]
    async fn update(&self, system: &System) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query(
                    r#"
                    UPDATE systems
                    SET name = $2, description = $3, application_id = $4, users = $5
                    WHERE id = $1
                    "#,
                )
                .bind(*system.id().as_uuid())
                .bind(system.name())
                .bind(system.description())
                .bind(system.application_id())
                .bind(system.users()),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: SystemId) -> Result<(), StorageError> {
        self.handle
            .execute(sqlx::query("DELETE FROM systems WHERE id = $1").bind(*id.as_uuid()))
            .await?;
        Ok(())
    }

    async fn find(&self, id: SystemId) -> Result<Option<System>, StorageError> {
        let row = self
            .handle
            .fetch_optional(
                sqlx::query_as::<_, SystemRow>(
                    "SELECT id, name, description, application_id, users FROM systems WHERE id = $1",
                )
                .bind(*id.as_uuid()),
            )
            .await?;
        Ok(row.map(System::from))
    }

    async fn find_all(&self) -> Result<Vec<System>, StorageError> {
        let rows = self
            .handle
            .fetch_all(sqlx::query_as::<_, SystemRow>(
                "SELECT id, name, description, application_id, users FROM systems ORDER BY name",
            ))
            .await?;
        Ok(rows.into_iter().map(System::from).collect())
    }
}
