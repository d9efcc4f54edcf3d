//! Agreement use cases
//!
//! Agreements reference plans and own services, so both use cases run
//! inside a unit of work.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument};

use core_kernel::{AgreementId, PlanId};
use domain_agreement::{Agreement, AgreementTerms};
use infra_db::{DatabaseHandle, RepositoryKind, UnitOfWork, UnitOfWorkError};

use crate::error::UseCaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAgreementInput {
    pub code: String,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub provider_plan_id: PlanId,
    pub local_plan_id: PlanId,
}

impl From<CreateAgreementInput> for AgreementTerms {
    fn from(input: CreateAgreementInput) -> Self {
        AgreementTerms {
            code: input.code,
            year: input.year,
            start_date: input.start_date,
            end_date: input.end_date,
            provider_plan_id: input.provider_plan_id,
            local_plan_id: input.local_plan_id,
        }
    }
}

pub struct CreateAgreementUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> CreateAgreementUseCase<H> {
    /// Repositories the use case reads or writes, checked by `new`
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::Plan,
        RepositoryKind::Agreement,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Creates revision 0 of an agreement; both plans must exist
    #[instrument(skip(self), fields(code = %input.code, year = input.year))]
    pub async fn execute(&self, input: CreateAgreementInput) -> Result<Agreement, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let plans = uow.plans()?;
                    for plan_id in [input.provider_plan_id, input.local_plan_id] {
                        if plans.find(plan_id).await?.is_none() {
                            return Err(UseCaseError::not_found("Plan", plan_id.as_uuid()));
                        }
                    }

                    let agreement = Agreement::create(input.into())?;
                    uow.agreements()?.insert(&agreement).await?;
                    Ok::<_, UseCaseError>(agreement)
                })
            })
            .await
    }
}

pub struct ReviseAgreementUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> ReviseAgreementUseCase<H> {
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::Agreement,
        RepositoryKind::Service,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Freezes the agreement and opens its next revision
    ///
    /// Every service of the agreement is copied, system allocations
    /// included, into the new revision. Users lists stay with the revision
    /// they were recorded for.
    #[instrument(skip(self), fields(agreement_id = %agreement_id))]
    pub async fn execute(&self, agreement_id: AgreementId) -> Result<Agreement, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let agreements = uow.agreements()?;
                    let services = uow.services()?;

                    let mut agreement = agreements
                        .find(agreement_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("Agreement", agreement_id.as_uuid()))?;

                    let next = agreement.next_revision()?;
                    agreement.mark_revised();
                    agreements.update(&agreement).await?;
                    agreements.insert(&next).await?;

                    let copied = services.find_by_agreement(agreement_id).await?;
                    for service in &copied {
                        services.insert(&service.copy_to(next.id())).await?;
                    }

                    info!(
                        revision = next.revision(),
                        services = copied.len(),
                        "agreement revised"
                    );
                    Ok::<_, UseCaseError>(next)
                })
            })
            .await
    }
}
