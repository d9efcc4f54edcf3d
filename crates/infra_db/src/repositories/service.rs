//! Service repository implementation
//!
//! A service is stored in `services` with its system associations in
//! `service_systems`. Writes replace the association rows of the service
//! and run inside one transaction, opened locally when the repository is
//! bound to the pool.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{AgreementId, Currency, ServiceId, StorageError, SystemId};
use domain_agreement::{Service, ServiceDetails, ServiceRepository, ServiceStatus};

use crate::error::DatabaseError;
use crate::handle::{DatabaseHandle, PgHandle};

/// Database row for services
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: Uuid,
    pub agreement_id: Uuid,
    pub name: String,
    pub description: String,
    pub run_amount: Decimal,
    pub change_amount: Decimal,
    pub currency: String,
    pub responsible_email: String,
    pub provider_allocation: Decimal,
    pub local_allocation: Decimal,
    pub status: String,
    pub is_active: bool,
}

/// Database row for service system associations
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceSystemRow {
    pub service_id: Uuid,
    pub system_id: Uuid,
    pub allocation: Decimal,
    pub amount: Decimal,
}

const SELECT_SERVICE: &str = r#"
    SELECT id, agreement_id, name, description, run_amount, change_amount, currency,
           responsible_email, provider_allocation, local_allocation, status, is_active
    FROM services
"#;

fn to_service(row: ServiceRow, systems: Vec<ServiceSystemRow>) -> Result<Service, StorageError> {
    let currency: Currency = row
        .currency
        .parse()
        .map_err(|e| StorageError::mapping(format!("service {}: {}", row.id, e)))?;
    let status: ServiceStatus = row
        .status
        .parse()
        .map_err(|e| StorageError::mapping(format!("service {}: {}", row.id, e)))?;

    let id = row.id;
    Service::restore(
        ServiceId::from_uuid(row.id),
        AgreementId::from_uuid(row.agreement_id),
        ServiceDetails {
            name: row.name,
            description: row.description,
            run_amount: row.run_amount,
            change_amount: row.change_amount,
            currency,
            responsible_email: row.responsible_email,
            provider_allocation: row.provider_allocation,
            local_allocation: row.local_allocation,
        },
        status,
        systems
            .into_iter()
            .map(|s| (SystemId::from_uuid(s.system_id), s.allocation))
            .collect(),
    )
    .map_err(|e| StorageError::mapping(format!("service {}: {}", id, e)))
}

/// PostgreSQL service repository
#[derive(Debug, Clone)]
pub struct PgServiceRepository {
    handle: PgHandle,
}

impl PgServiceRepository {
    pub fn new(handle: PgHandle) -> Self {
        Self { handle }
    }

    async fn replace_systems(handle: &PgHandle, service: &Service) -> Result<(), DatabaseError> {
        handle
            .execute(
                sqlx::query("DELETE FROM service_systems WHERE service_id = $1")
                    .bind(*service.id().as_uuid()),
            )
            .await?;

        for (position, association) in service.systems().iter().enumerate() {
            handle
                .execute(
                    sqlx::query(
                        r#"
                        INSERT INTO service_systems (service_id, system_id, allocation, amount, position)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(*service.id().as_uuid())
                    .bind(*association.system_id().as_uuid())
                    .bind(association.allocation())
                    .bind(association.amount())
                    .bind(position as i32),
                )
                .await?;
        }
        Ok(())
    }

    async fn load_systems(&self, service_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<ServiceSystemRow>>, DatabaseError> {
        let rows = self
            .handle
            .fetch_all(
                sqlx::query_as::<_, ServiceSystemRow>(
                    r#"
                    SELECT service_id, system_id, allocation, amount
                    FROM service_systems
                    WHERE service_id = ANY($1)
                    ORDER BY service_id, position
                    "#,
                )
                .bind(service_ids),
            )
            .await?;

        let mut grouped: HashMap<Uuid, Vec<ServiceSystemRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.service_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    #[instrument(skip(self, service), fields(service_id = %service.id()))]
    async fn insert(&self, service: &Service) -> Result<(), StorageError> {
        let (tx, owned) = self.handle.local_transaction().await?;

        tx.execute(
            sqlx::query(
                r#"
                INSERT INTO services (
                    id, agreement_id, name, description, run_amount, change_amount, currency,
                    responsible_email, provider_allocation, local_allocation, status, is_active
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(*service.id().as_uuid())
            .bind(*service.agreement_id().as_uuid())
            .bind(service.name())
            .bind(service.description())
            .bind(service.run_amount())
            .bind(service.change_amount())
            .bind(service.currency().code())
            .bind(service.responsible_email())
            .bind(service.provider_allocation())
            .bind(service.local_allocation())
            .bind(service.status().as_str())
            .bind(service.is_active()),
        )
        .await?;
        Self::replace_systems(&tx, service).await?;

        if owned {
            tx.commit().await?;
        }
        debug!(systems = service.systems().len(), "service inserted");
        Ok(())
    }

    #[instrument(skip(self, service), fields(service_id = %service.id()))]
    async fn update(&self, service: &Service) -> Result<(), StorageError> {
        let (tx, owned) = self.handle.local_transaction().await?;

        let updated = tx
            .execute(
                sqlx::query(
                    r#"
                    UPDATE services
                    SET agreement_id = $2, name = $3, description = $4, run_amount = $5,
                        change_amount = $6, currency = $7, responsible_email = $8,
                        provider_allocation = $9, local_allocation = $10, status = $11,
                        is_active = $12
                    WHERE id = $1
                    "#,
                )
                .bind(*service.id().as_uuid())
                .bind(*service.agreement_id().as_uuid())
                .bind(service.name())
                .bind(service.description())
                .bind(service.run_amount())
                .bind(service.change_amount())
                .bind(service.currency().code())
                .bind(service.responsible_email())
                .bind(service.provider_allocation())
                .bind(service.local_allocation())
                .bind(service.status().as_str())
                .bind(service.is_active()),
            )
            .await?;
        if updated > 0 {
            Self::replace_systems(&tx, service).await?;
        }

        if owned {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn delete(&self, id: ServiceId) -> Result<(), StorageError> {
        // service_systems rows cascade
        self.handle
            .execute(sqlx::query("DELETE FROM services WHERE id = $1").bind(*id.as_uuid()))
            .await?;
        Ok(())
    }

    async fn find(&self, id: ServiceId) -> Result<Option<Service>, StorageError> {
        let row = self
            .handle
            .fetch_optional(
                sqlx::query_as::<_, ServiceRow>(&format!("{} WHERE id = $1", SELECT_SERVICE))
                    .bind(*id.as_uuid()),
            )
            .await?;

        match row {
            Some(row) => {
                let mut systems = self.load_systems(vec![row.id]).await?;
                let associations = systems.remove(&row.id).unwrap_or_default();
                to_service(row, associations).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn find_by_agreement(&self, agreement_id: AgreementId) -> Result<Vec<Service>, StorageError> {
        let rows = self
            .handle
            .fetch_all(
                sqlx::query_as::<_, ServiceRow>(&format!(
                    "{} WHERE agreement_id = $1 ORDER BY id",
                    SELECT_SERVICE
                ))
                .bind(*agreement_id.as_uuid()),
            )
            .await?;

        let mut systems = self
            .load_systems(rows.iter().map(|r| r.id).collect())
            .await?;
        rows.into_iter()
            .map(|row| {
                let associations = systems.remove(&row.id).unwrap_or_default();
                to_service(row, associations)
            })
            .collect()
    }
}
