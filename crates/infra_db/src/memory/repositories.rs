//! Repository ports over the in-memory store

use async_trait::async_trait;

use core_kernel::{AgreementId, PlanId, ServiceId, StorageError, SystemId, UserId, UsersListId};
use domain_agreement::{
    Agreement, AgreementRepository, Plan, PlanRepository, Service, ServiceRepository, System,
    SystemRepository, User, UserRepository, UsersList, UsersListRepository,
};

use super::MemoryHandle;

macro_rules! memory_repository {
    ($name:ident) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            handle: MemoryHandle,
        }

        impl $name {
            pub fn new(handle: MemoryHandle) -> Self {
                Self { handle }
            }
        }
    };
}

memory_repository!(MemoryPlanRepository);
memory_repository!(MemorySystemRepository);
memory_repository!(MemoryUserRepository);
memory_repository!(MemoryAgreementRepository);
memory_repository!(MemoryServiceRepository);
memory_repository!(MemoryUsersListRepository);

#[async_trait]
impl PlanRepository for MemoryPlanRepository {
    async fn insert(&self, plan: &Plan) -> Result<(), StorageError> {
        self.handle.write(|s| s.insert_plan(plan)).await
    }

    async fn update(&self, plan: &Plan) -> Result<(), StorageError> {
        self.handle.write(|s| s.update_plan(plan)).await
    }

    async fn delete(&self, id: PlanId) -> Result<(), StorageError> {
        self.handle.write(|s| s.delete_plan(id)).await
    }

    async fn find(&self, id: PlanId) -> Result<Option<Plan>, StorageError> {
        Ok(self.handle.read(|s| s.plans.get(&id).cloned()).await)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Plan>, StorageError> {
        let code = code.trim();
        Ok(self
            .handle
            .read(|s| s.plans.values().find(|p| p.code() == code).cloned())
            .await)
    }

    async fn find_all(&self) -> Result<Vec<Plan>, StorageError> {
        let mut plans = self.handle.read(|s| s.plans.values().cloned().collect::<Vec<_>>()).await;
        plans.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(plans)
    }
}

#[async_trait]
impl SystemRepository for MemorySystemRepository {
    async fn insert(&self, system: &System) -> Result<(), StorageError> {
        self.handle.write(|s| s.insert_system(system)).await
    }

    async fn update(&self, system: &System) -> Result<(), StorageError> {
        self.handle.write(|s| s.update_system(system)).await
    }

    async fn delete(&self, id: SystemId) -> Result<(), StorageError> {
        self.handle.write(|s| s.delete_system(id)).await
    }

    async fn find(&self, id: SystemId) -> Result<Option<System>, StorageError> {
        Ok(self.handle.read(|s| s.systems.get(&id).cloned()).await)
    }

    async fn find_all(&self) -> Result<Vec<System>, StorageError> {
        let mut systems = self.handle.read(|s| s.systems.values().cloned().collect::<Vec<_>>()).await;
        systems.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(systems)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), StorageError> {
        self.handle.write(|s| s.insert_user(user)).await
    }

    async fn update(&self, user: &User) -> Result<(), StorageError> {
        self.handle.write(|s| s.update_user(user)).await
    }

    async fn delete(&self, id: UserId) -> Result<(), StorageError> {
        self.handle
            .write(|s| {
                s.users.remove(&id);
                Ok(())
            })
            .await
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.handle.read(|s| s.users.get(&id).cloned()).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self.handle.read(|s| s.find_user_by_email(email).cloned()).await)
    }

    async fn find_all(&self) -> Result<Vec<User>, StorageError> {
        let mut users = self.handle.read(|s| s.users.values().cloned().collect::<Vec<_>>()).await;
        users.sort_by(|a, b| a.email().cmp(b.email()));
        Ok(users)
    }
}

#[async_trait]
impl AgreementRepository for MemoryAgreementRepository {
    async fn insert(&self, agreement: &Agreement) -> Result<(), StorageError> {
        self.handle.write(|s| s.insert_agreement(agreement)).await
    }

    async fn update(&self, agreement: &Agreement) -> Result<(), StorageError> {
        self.handle.write(|s| s.update_agreement(agreement)).await
    }

    async fn delete(&self, id: AgreementId) -> Result<(), StorageError> {
        self.handle.write(|s| s.delete_agreement(id)).await
    }

    async fn find(&self, id: AgreementId) -> Result<Option<Agreement>, StorageError> {
        Ok(self.handle.read(|s| s.agreements.get(&id).cloned()).await)
    }

    async fn find_by_year(&self, year: i32) -> Result<Vec<Agreement>, StorageError> {
        let mut agreements = self
            .handle
            .read(|s| {
                s.agreements
                    .values()
                    .filter(|a| a.year() == year)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        agreements.sort_by(|a, b| (a.code(), a.revision()).cmp(&(b.code(), b.revision())));
        Ok(agreements)
    }

    async fn find_all(&self) -> Result<Vec<Agreement>, StorageError> {
        let mut agreements = self.handle.read(|s| s.agreements.values().cloned().collect::<Vec<_>>()).await;
        agreements.sort_by(|a, b| {
            (b.year(), a.code(), a.revision()).cmp(&(a.year(), b.code(), b.revision()))
        });
        Ok(agreements)
    }
}

#[async_trait]
impl ServiceRepository for MemoryServiceRepository {
    async fn insert(&self, service: &Service) -> Result<(), StorageError> {
        self.handle.write(|s| s.insert_service(service)).await
    }

    async fn update(&self, service: &Service) -> Result<(), StorageError> {
        self.handle.write(|s| s.update_service(service)).await
    }

    async fn delete(&self, id: ServiceId) -> Result<(), StorageError> {
        self.handle.write(|s| s.delete_service(id)).await
    }

    async fn find(&self, id: ServiceId) -> Result<Option<Service>, StorageError> {
        Ok(self.handle.read(|s| s.services.get(&id).cloned()).await)
    }

    async fn find_by_agreement(&self, agreement_id: AgreementId) -> Result<Vec<Service>, StorageError> {
        Ok(self
            .handle
            .read(|s| {
                s.services
                    .values()
                    .filter(|service| service.agreement_id() == agreement_id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}

#[async_trait]
impl UsersListRepository for MemoryUsersListRepository {
    async fn insert(&self, list: &UsersList) -> Result<(), StorageError> {
        self.handle.write(|s| s.insert_users_list(list)).await
    }

    async fn update(&self, list: &UsersList) -> Result<(), StorageError> {
        self.handle.write(|s| s.update_users_list(list)).await
    }

    async fn delete(&self, id: UsersListId) -> Result<(), StorageError> {
        self.handle
            .write(|s| {
                s.users_lists.remove(&id);
                Ok(())
            })
            .await
    }

    async fn find(&self, id: UsersListId) -> Result<Option<UsersList>, StorageError> {
        Ok(self.handle.read(|s| s.users_lists.get(&id).cloned()).await)
    }

    async fn find_by_service(&self, service_id: ServiceId) -> Result<Option<UsersList>, StorageError> {
        Ok(self
            .handle
            .read(|s| s.find_users_list_by_service(service_id).cloned())
            .await)
    }

    async fn find_by_system(&self, system_id: SystemId) -> Result<Vec<UsersList>, StorageError> {
        Ok(self
            .handle
            .read(|s| {
                s.users_lists
                    .values()
                    .filter(|l| l.system_id() == system_id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}
