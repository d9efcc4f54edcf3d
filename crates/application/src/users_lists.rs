//! Users list use cases

use serde::Deserialize;
use tracing::{debug, instrument};

use core_kernel::{ServiceId, SystemId, UsersListItemId};
use domain_agreement::{UsersList, UsersListItem, UsersListItemData};
use infra_db::{DatabaseHandle, RepositoryKind, UnitOfWork, UnitOfWorkError};

use crate::error::UseCaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct SaveUsersListItemInput {
    pub service_id: ServiceId,
    pub system_id: SystemId,
    #[serde(flatten)]
    pub item: UsersListItemData,
}

pub struct SaveUsersListItemUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> SaveUsersListItemUseCase<H> {
    /// Repositories the use case reads or writes, checked by `new`
    pub const REQUIRED: &'static [RepositoryKind] = &[
        RepositoryKind::Agreement,
        RepositoryKind::Service,
        RepositoryKind::UsersList,
    ];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Adds a person to the users list of a service
    ///
    /// The list is created with the first item, for the given system and the
    /// year and revision of the service's agreement.
    #[instrument(skip(self), fields(service_id = %input.service_id, system_id = %input.system_id))]
    pub async fn execute(&self, input: SaveUsersListItemInput) -> Result<UsersList, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let users_lists = uow.users_lists()?;
                    let service = uow
                        .services()?
                        .find(input.service_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("Service", input.service_id.as_uuid()))?;
                    if !service.has_system(input.system_id) {
                        return Err(UseCaseError::validation(format!(
                            "System ID #{} is not assigned to service {}",
                            input.system_id.as_uuid(),
                            service.name()
                        )));
                    }

                    let item = UsersListItem::create(input.item)?;
                    match users_lists.find_by_service(service.id()).await? {
                        Some(mut list) => {
                            if list.system_id() != input.system_id {
                                return Err(UseCaseError::validation(format!(
                                    "Service {} already keeps its users list for system ID #{}",
                                    service.name(),
                                    list.system_id().as_uuid()
                                )));
                            }
                            list.add_item(item)?;
                            users_lists.update(&list).await?;
                            Ok::<_, UseCaseError>(list)
                        }
                        None => {
                            let agreement = uow
                                .agreements()?
                                .find(service.agreement_id())
                                .await?
                                .ok_or_else(|| {
                                    UseCaseError::not_found("Agreement", service.agreement_id().as_uuid())
                                })?;
                            let mut list = UsersList::create(
                                service.id(),
                                input.system_id,
                                agreement.year(),
                                agreement.revision(),
                            );
                            list.add_item(item)?;
                            debug!(users_list_id = %list.id(), "users list created");
                            users_lists.insert(&list).await?;
                            Ok(list)
                        }
                    }
                })
            })
            .await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveUsersListItemInput {
    pub service_id: ServiceId,
    pub item_id: UsersListItemId,
}

pub struct RemoveUsersListItemUseCase<H: DatabaseHandle> {
    uow: UnitOfWork<H>,
}

impl<H: DatabaseHandle> RemoveUsersListItemUseCase<H> {
    pub const REQUIRED: &'static [RepositoryKind] = &[RepositoryKind::UsersList];

    pub fn new(uow: UnitOfWork<H>) -> Result<Self, UnitOfWorkError> {
        uow.require(Self::REQUIRED)?;
        Ok(Self { uow })
    }

    /// Removes a person from the users list of a service
    #[instrument(skip(self), fields(service_id = %input.service_id, item_id = %input.item_id))]
    pub async fn execute(&self, input: RemoveUsersListItemInput) -> Result<UsersList, UseCaseError> {
        self.uow
            .execute(move |uow| {
                Box::pin(async move {
                    let users_lists = uow.users_lists()?;
                    let mut list = users_lists
                        .find_by_service(input.service_id)
                        .await?
                        .ok_or_else(|| UseCaseError::not_found("Users list for service", input.service_id.as_uuid()))?;
                    if !list.remove_item(input.item_id) {
                        return Err(UseCaseError::not_found("Users list item", input.item_id.as_uuid()));
                    }
                    users_lists.update(&list).await?;
                    Ok::<_, UseCaseError>(list)
                })
            })
            .await
    }
}
