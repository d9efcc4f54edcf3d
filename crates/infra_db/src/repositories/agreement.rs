//! Agreement repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{AgreementId, PlanId, StorageError};
use domain_agreement::{Agreement, AgreementRepository};

use crate::handle::PgHandle;

/// Database row for agreements
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgreementRow {
    pub id: Uuid,
    pub code: String,
    pub year: i32,
    pub revision: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub provider_plan_id: Uuid,
    pub local_plan_id: Uuid,
    pub is_revised: bool,
}

impl From<AgreementRow> for Agreement {
    fn from(row: AgreementRow) -> Self {
        Agreement::restore(
            AgreementId::from_uuid(row.id),
            row.code,
            row.year,
            row.revision,
            row.start_date,
            row.end_date,
            PlanId::from_uuid(row.provider_plan_id),
            PlanId::from_uuid(row.local_plan_id),
            row.is_revised,
        )
    }
}

const SELECT_AGREEMENT: &str = r#"
    SELECT id, code, year, revision, start_date, end_date,
           provider_plan_id, local_plan_id, is_revised
    FROM agreements
"#;

/// PostgreSQL agreement repository
#[derive(Debug, Clone)]
pub struct PgAgreementRepository {
    handle: PgHandle,
}

impl PgAgreementRepository {
    pub fn new(handle: PgHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl AgreementRepository for PgAgreementRepository {
    #[instrument(skip(self, agreement), fields(agreement_id = %agreement.id()))]
    async fn insert(&self, agreement: &Agreement) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query(
                    r#"
                    INSERT INTO agreements (
                        id, code, year, revision, start_date, end_date,
                        provider_plan_id, local_plan_id, is_revised
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(*agreement.id().as_uuid())
                .bind(agreement.code())
                .bind(agreement.year())
                .bind(agreement.revision())
                .bind(agreement.start_date())
                .bind(agreement.end_date())
                .bind(*agreement.provider_plan_id().as_uuid())
                .bind(*agreement.local_plan_id().as_uuid())
                .bind(agreement.is_revised()),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, agreement), fields(agreement_id = %agreement.id()))]
    async fn update(&self, agreement: &Agreement) -> Result<(), StorageError> {
        self.handle
            .execute(
                sqlx::query(
                    r#"
                    UPDATE agreements
                    SET code = $2, year = $3, revision = $4, start_date = $5, end_date = $6,
                        provider_plan_id = $7, local_plan_id = $8, is_revised = $9
                    WHERE id = $1
                    "#,
                )
                .bind(*agreement.id().as_uuid())
                .bind(agreement.code())
                .bind(agreement.year())
                .bind(agreement.revision())
                .bind(agreement.start_date())
                .bind(agreement.end_date())
                .bind(*agreement.provider_plan_id().as_uuid())
                .bind(*agreement.local_plan_id().as_uuid())
                .bind(agreement.is_revised()),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: AgreementId) -> Result<(), StorageError> {
        self.handle
            .execute(sqlx::query("DELETE FROM agreements WHERE id = $1").bind(*id.as_uuid()))
            .await?;
        Ok(())
    }

    async fn find(&self, id: AgreementId) -> Result<Option<Agreement>, StorageError> {
        let row = self
            .handle
            .fetch_optional(
                sqlx::query_as::<_, AgreementRow>(&format!("{} WHERE id = $1", SELECT_AGREEMENT))
                    .bind(*id.as_uuid()),
            )
            .await?;
        Ok(row.map(Agreement::from))
    }

    async fn find_by_year(&self, year: i32) -> Result<Vec<Agreement>, StorageError> {
        let rows = self
            .handle
            .fetch_all(
                sqlx::query_as::<_, AgreementRow>(&format!(
                    "{} WHERE year = $1 ORDER BY code, revision",
                    SELECT_AGREEMENT
                ))
                .bind(year),
            )
            .await?;
        Ok(rows.into_iter().map(Agreement::from).collect())
    }

    async fn find_all(&self) -> Result<Vec<Agreement>, StorageError> {
        let rows = self
            .handle
            .fetch_all(sqlx::query_as::<_, AgreementRow>(&format!(
                "{} ORDER BY year DESC, code, revision",
                SELECT_AGREEMENT
            )))
            .await?;
        Ok(rows.into_iter().map(Agreement::from).collect())
    }
}
