//! Plan repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{PlanId, StorageError};
use domain_agreement::{Plan, PlanRepository};

use crate::handle::PgHandle;

/// Database row for plans
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub euro: Decimal,
    pub plan_date: NaiveDate,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan::restore(
            PlanId::from_uuid(row.id),
            row.code,
            row.description,
            row.euro,
            row.plan_date,
        )
    }
}

const SELECT_PLAN: &str = "SELECT id, code, description, euro, plan_date FROM plans";

/// PostgreSQL plan repository
#[derive(Debug, Clone)]
pub struct PgPlanRepository {
    handle: PgHandle,
}

impl PgPlanRepository {
    /// Creates a repository bound to the given handle
    pub fn new(handle: PgHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    #[instrument(skip(self, plan), fields(plan_id = %plan.id()))]
    async fn insert(&self, plan: &Plan) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query(
                    "INSERT INTO plans (id, code, description, euro, plan_date) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(*plan.id().as_uuid())
                .bind(plan.code())
                .bind(plan.description())
                .bind(plan.euro())
                .bind(plan.plan_date()),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, plan), fields(plan_id = %plan.id()))]
    async fn update(&self, plan: &Plan) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query(
                    "UPDATE plans SET code = $2, description = $3, euro = $4, plan_date = $5 WHERE id = $1",
                )
                .bind(*plan.id().as_uuid())
                .bind(plan.code())
                .bind(plan.description())
                .bind(plan.euro())
                .bind(plan.plan_date()),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: PlanId) -> Result<(), StorageError> {
        self.handle
            .execute(sqlx::query("DELETE FROM plans WHERE id = $1").bind(*id.as_uuid()))
            .await?;
        Ok(())
    }

    async fn find(&self, id: PlanId) -> Result<Option<Plan>, StorageError> {
        let row = self
            .handle
            .fetch_optional(
                sqlx::query_as::<_, PlanRow>(&format!("{} WHERE id = $1", SELECT_PLAN))
                    .bind(*id.as_uuid()),
            )
            .await?;
        Ok(row.map(Plan::from))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Plan>, StorageError> {
        let row = self
            .handle
            .fetch_optional(
                sqlx::query_as::<_, PlanRow>(&format!("{} WHERE code = $1", SELECT_PLAN))
                    .bind(code.trim()),
            )
            .await?;
        Ok(row.map(Plan::from))
    }

    async fn find_all(&self) -> Result<Vec<Plan>, StorageError> {
        let rows = self
            .handle
            .fetch_all(sqlx::query_as::<_, PlanRow>(&format!("{} ORDER BY code", SELECT_PLAN)))
            .await?;
        Ok(rows.into_iter().map(Plan::from).collect())
    }
}
