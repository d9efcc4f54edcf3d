//! Users list repository implementation
//!
//! Items live in `users_list_items` and are replaced together with their list.
//! `users_number` is written from the item count for reporting queries and
//! never read back.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{ServiceId, StorageError, SystemId, UsersListId, UsersListItemId};
use domain_agreement::{UsersList, UsersListItem, UsersListItemData, UsersListRepository};

use crate::error::DatabaseError;
use crate::handle::{DatabaseHandle, PgHandle};

/// Database row for users lists
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsersListRow {
    pub id: Uuid,
    pub service_id: Uuid,
    pub system_id: Uuid,
    pub year: i32,
    pub revision: i32,
}

/// Database row for users list items
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsersListItemRow {
    pub id: Uuid,
    pub users_list_id: Uuid,
    pub name: String,
    pub email: String,
    pub corp_user_id: String,
    pub area: String,
    pub cost_center: String,
}

impl From<UsersListItemRow> for UsersListItem {
    fn from(row: UsersListItemRow) -> Self {
        UsersListItem::restore(
            UsersListItemId::from_uuid(row.id),
            UsersListItemData {
                name: row.name,
                email: row.email,
                corp_user_id: row.corp_user_id,
                area: row.area,
                cost_center: row.cost_center,
            },
        )
    }
}

fn to_users_list(row: UsersListRow, items: Vec<UsersListItemRow>) -> UsersList {
    UsersList::restore(
        UsersListId::from_uuid(row.id),
        ServiceId::from_uuid(row.service_id),
        SystemId::from_uuid(row.system_id),
        row.year,
        row.revision,
        items.into_iter().map(UsersListItem::from).collect(),
    )
}

const SELECT_USERS_LIST: &str = "SELECT id, service_id, system_id, year, revision FROM users_lists";

/// PostgreSQL users list repository
#[derive(Debug, Clone)]
pub struct PgUsersListRepository {
    handle: PgHandle,
}

impl PgUsersListRepository {
    pub fn new(handle: PgHandle) -> Self {
        Self { handle }
    }

    async fn replace_items(handle: &PgHandle, list: &UsersList) -> Result<(), DatabaseError> {
        handle
            .execute(
                sqlx::query("DELETE FROM users_list_items WHERE users_list_id = $1")
                    .bind(*list.id().as_uuid()),
            )
            .await?;

        for (position, item) in list.items().iter().enumerate() {
            handle
                .execute(
                    sqlx::query(
                        r#"
                        INSERT INTO users_list_items (
                            id, users_list_id, name, email, corp_user_id, area, cost_center, position
                        )
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                        "#,
                    )
                    .bind(*item.id().as_uuid())
                    .bind(*list.id().as_uuid())
                    .bind(item.name())
                    .bind(item.email())
                    .bind(item.corp_user_id())
                    .bind(item.area())
                    .bind(item.cost_center())
                    .bind(position as i32),
                )
                .await?;
        }
        Ok(())
    }

    async fn load_items(&self, list_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<UsersListItemRow>>, DatabaseError> {
        let rows = self
            .handle
            .fetch_all(
                sqlx::query_as::<_, UsersListItemRow>(
                    r#"
                    SELECT id, users_list_id, name, email, corp_user_id, area, cost_center
                    FROM users_list_items
                    WHERE users_list_id = ANY($1)
                    ORDER BY users_list_id, position
                    "#,
                )
                .bind(list_ids),
            )
            .await?;

        let mut grouped: HashMap<Uuid, Vec<UsersListItemRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.users_list_id).or_default().push(row);
        }
        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<UsersListRow>) -> Result<Vec<UsersList>, DatabaseError> {
        let mut items = self.load_items(rows.iter().map(|r| r.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let list_items = items.remove(&row.id).unwrap_or_default();
                to_users_list(row, list_items)
            })
            .collect())
    }
}

#[async_trait]
impl UsersListRepository for PgUsersListRepository {
    #[instrument(skip(self, list), fields(users_list_id = %list.id(), users = list.users_number()))]
    async fn insert(&self, list: &UsersList) -> Result<(), StorageError> {
        let (tx, owned) = self.handle.local_transaction().await?;

        tx.execute(
            sqlx::query(
                r#"
                INSERT INTO users_lists (id, service_id, system_id, year, revision, users_number)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(*list.id().as_uuid())
            .bind(*list.service_id().as_uuid())
            .bind(*list.system_id().as_uuid())
            .bind(list.year())
            .bind(list.revision())
            .bind(list.users_number() as i32),
        )
        .await?;
        Self::replace_items(&tx, list).await?;

        if owned {
            tx.commit().await?;
        }
        Ok(())
    }

    #[instrument(skip(self, list), fields(users_list_id = %list.id(), users = list.users_number()))]
    async fn update(&self, list: &UsersList) -> Result<(), StorageError> {
        let (tx, owned) = self.handle.local_transaction().await?;

        let updated = tx
            .execute(
                sqlx::query(
                    r#"
                    UPDATE users_lists
                    SET service_id = $2, system_id = $3, year = $4, revision = $5, users_number = $6
                    WHERE id = $1
                    "#,
                )
                .bind(*list.id().as_uuid())
                .bind(*list.service_id().as_uuid())
                .bind(*list.system_id().as_uuid())
                .bind(list.year())
                .bind(list.revision())
                .bind(list.users_number() as i32),
            )
            .await?;
        if updated > 0 {
            Self::replace_items(&tx, list).await?;
        }

        if owned {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn delete(&self, id: UsersListId) -> Result<(), StorageError> {
        self.handle
            .execute(sqlx::query("DELETE FROM users_lists WHERE id = $1").bind(*id.as_uuid()))
            .await?;
        Ok(())
    }

    async fn find(&self, id: UsersListId) -> Result<Option<UsersList>, StorageError> {
        let row = self
            .handle
            .fetch_optional(
                sqlx::query_as::<_, UsersListRow>(&format!("{} WHERE id = $1", SELECT_USERS_LIST))
                    .bind(*id.as_uuid()),
            )
            .await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_service(&self, service_id: ServiceId) -> Result<Option<UsersList>, StorageError> {
        let row = self
            .handle
            .fetch_optional(
                sqlx::query_as::<_, UsersListRow>(&format!(
                    "{} WHERE service_id = $1",
                    SELECT_USERS_LIST
                ))
                .bind(*service_id.as_uuid()),
            )
            .await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_system(&self, system_id: SystemId) -> Result<Vec<UsersList>, StorageError> {
        let rows = self
            .handle
            .fetch_all(
                sqlx::query_as::<_, UsersListRow>(&format!(
                    "{} WHERE system_id = $1 ORDER BY year, revision, id",
                    SELECT_USERS_LIST
                ))
                .bind(*system_id.as_uuid()),
            )
            .await?;
        Ok(self.hydrate(rows).await?)
    }
}
