//! Service use cases
//!
//! A service belongs to an agreement, references systems and may own a
//! users list, so every use case here runs inside a unit of work.
//!
//! Services of a revised agreement are frozen: once the next revision
//! exists, only its copies can change.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use core_kernel::{AgreementId, ServiceId, SystemId, UserId};
use domain_agreement::{Agreement, Service, ServiceDetails};
use infra_db::{DatabaseHandle, RepositoryKind, UnitOfWork, UnitOfWorkError};

use crate::error::UseCaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceInput {
    pub agreement_id: AgreementId,
    #[serde(flatten)]
    pub details: ServiceDetails,
}

/// Loads the agreement and fails when it has been revised
async fn open_agreement<H: DatabaseHandle>(
    uow: &UnitOfWork<H>,
    agreement_id: AgreementId,
) -> Result<Agreement, UseCaseError> {
    let agreement = uow
        .agreements()?
        .find(agreement_id)
        .await?
        .ok_or_else(|| UseCaseError::not_found("Agreement", agreement_id.as_uuid()))?;
    if agreement.is_revised() {
        return Err(UseCaseError::validation(format!(
            "Agreement {} revision {} has been revised and can no longer change",
            agreement.code(),
            agreement.revision()
        )));
    }
    Ok(agreement)
}

pub struct CreateServiceUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> CreateServiceUseCase<H> {
    /// Repositories the use case reads or writes, checked by `new`
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::Agreement,
        RepositoryKind::Service,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Adds a service to an agreement that has not been revised
    #[instrument(skip(self), fields(agreement_id = %input.agreement_id))]
    pub async fn execute(&self, input: CreateServiceInput) -> Result<Service, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let agreement = open_agreement(uow, input.agreement_id).await?;
                    let service = Service::create(agreement.id(), input.details)?;
                    uow.services()?.insert(&service).await?;
                    Ok::<_, UseCaseError>(service)
                })
            })
            .await
    }
}

pub struct DeleteServiceUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> DeleteServiceUseCase<H> {
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::Agreement,
        RepositoryKind::Service,
        RepositoryKind::UsersList,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Deletes a service together with its users list
    #[instrument(skip(self), fields(service_id = %service_id))]
    pub async fn execute(&self, service_id: ServiceId) -> Result<(), UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let services = uow.services()?;
                    let users_lists = uow.users_lists()?;

                    let service = services
                        .find(service_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("Service", service_id.as_uuid()))?;
                    open_agreement(uow, service.agreement_id()).await?;

                    if let Some(list) = users_lists.find_by_service(service_id).await? {
                        debug!(users_list_id = %list.id(), "deleting users list first");
                        users_lists.delete(list.id()).await?;
                    }
                    services.delete(service_id).await?;
                    Ok::<_, UseCaseError>(())
                })
            })
            .await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveServiceSystemInput {
    pub service_id: ServiceId,
    pub system_id: SystemId,
    pub allocation: Decimal,
}

pub struct SaveServiceSystemUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> SaveServiceSystemUseCase<H> {
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::System,
        RepositoryKind::Agreement,
        RepositoryKind::Service,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Adds a system to a service or changes its allocation
    ///
    /// The service becomes active once its allocations reach 100%.
    #[instrument(
        skip(self),
        fields(service_id = %input.service_id, system_id = %input.system_id, allocation = %input.allocation)
    )]
    pub async fn execute(&self, input: SaveServiceSystemInput) -> Result<Service, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let services = uow.services()?;
                    let mut service = services
                        .find(input.service_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("Service", input.service_id.as_uuid()))?;
                    open_agreement(uow, service.agreement_id()).await?;
                    if uow.systems()?.find(input.system_id).await?.is_none() {
                        return Err(UseCaseError::not_found("System", input.system_id.as_uuid()));
                    }

                    service.save_service_system(input.system_id, input.allocation)?;
                    services.update(&service).await?;
                    Ok::<_, UseCaseError>(service)
                })
            })
            .await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveServiceSystemInput {
    pub service_id: ServiceId,
    pub system_id: SystemId,
}

pub struct RemoveServiceSystemUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> RemoveServiceSystemUseCase<H> {
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::Agreement,
        RepositoryKind::Service,
        RepositoryKind::UsersList,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Drops a system from a service
    ///
    /// A users list the service keeps for that system is deleted with it.
    #[instrument(skip(self), fields(service_id = %input.service_id, system_id = %input.system_id))]
    pub async fn execute(&self, input: RemoveServiceSystemInput) -> Result<Service, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let services = uow.services()?;
                    let users_lists = uow.users_lists()?;

                    let mut service = services
                        .find(input.service_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("Service", input.service_id.as_uuid()))?;
                    open_agreement(uow, service.agreement_id()).await?;
                    if !service.remove_service_system(input.system_id) {
                        return Err(UseCaseError::validation(format!(
                            "System ID #{} is not assigned to service {}",
                            input.system_id.as_uuid(),
                            service.name()
                        )));
                    }

                    if let Some(list) = users_lists.find_by_service(service.id()).await? {
                        if list.system_id() == input.system_id {
                            users_lists.delete(list.id()).await?;
                        }
                    }
                    services.update(&service).await?;
                    Ok::<_, UseCaseError>(service)
                })
            })
            .await
    }
}

/// Step requested on a service's validation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAction {
    Assign,
    Approve,
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeServiceStatusInput {
    pub service_id: ServiceId,
    pub actor_id: UserId,
    pub action: ServiceAction,
}

pub struct ChangeServiceStatusUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> ChangeServiceStatusUseCase<H> {
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::User,
        RepositoryKind::Agreement,
        RepositoryKind::Service,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Moves a service through assign, approve and reject
    ///
    /// Approving and rejecting need an actor whose role can validate.
    #[instrument(skip(self), fields(service_id = %input.service_id, actor_id = %input.actor_id))]
    pub async fn execute(&self, input: ChangeServiceStatusInput) -> Result<Service, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let actor = uow
                        .users()?
                        .find(input.actor_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("User", input.actor_id.as_uuid()))?;
                    let services = uow.services()?;
                    let mut service = services
                        .find(input.service_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("Service", input.service_id.as_uuid()))?;
                    open_agreement(uow, service.agreement_id()).await?;

                    match input.action {
                        ServiceAction::Assign => service.assign()?,
                        ServiceAction::Approve | ServiceAction::Reject if !actor.can_validate() => {
                            return Err(UseCaseError::validation(format!(
                                "User {} with role {} cannot validate services",
                                actor.email(),
                                actor.role()
                            )));
                        }
                        ServiceAction::Approve => service.approve()?,
                        ServiceAction::Reject => service.reject()?,
                    }

                    services.update(&service).await?;
                    info!(status = %service.status(), "service status changed");
                    Ok::<_, UseCaseError>(service)
                })
            })
            .await
    }
}
