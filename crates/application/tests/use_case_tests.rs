//! Use case tests against the in-memory backend
//!
//! Each test gets its own store through `memory_unit_of_work`, seeds it with
//! the idle repositories and then drives the use cases.

use rust_decimal_macros::dec;

use application::*;
use core_kernel::{ServiceId, StorageError, SystemId};
use domain_agreement::{Agreement, Plan, Service, ServiceStatus, System, User};
use infra_db::{MemoryHandle, UnitOfWork};
use test_utils::{
    assert_error_message, assert_service_active, assert_service_inactive, memory_unit_of_work,
    AgreementFixtures, CatalogFixtures, UsersListFixtures,
};

struct World {
    uow: UnitOfWork<MemoryHandle>,
    plan: Plan,
    agreement: Agreement,
    service: Service,
    crm: System,
    erp: System,
}

async fn world() -> World {
    let uow = memory_unit_of_work();
    let plan = CatalogFixtures::plan_bp25();
    let agreement = AgreementFixtures::agreement(&plan);
    let service = AgreementFixtures::service(agreement.id());
    let crm = CatalogFixtures::system("CRM");
    let erp = CatalogFixtures::system("ERP");

    uow.plans().unwrap().insert(&plan).await.unwrap();
    uow.agreements().unwrap().insert(&agreement).await.unwrap();
    uow.systems().unwrap().insert(&crm).await.unwrap();
    uow.systems().unwrap().insert(&erp).await.unwrap();
    uow.services().unwrap().insert(&service).await.unwrap();

    World {
        uow,
        plan,
        agreement,
        service,
        crm,
        erp,
    }
}

async fn add_user(uow: &UnitOfWork<MemoryHandle>, user: User) -> User {
    uow.users().unwrap().insert(&user).await.unwrap();
    user
}

mod service_system_tests {
    use super::*;

    #[tokio::test]
    async fn test_two_half_allocations_activate_the_service() {
        let w = world().await;
        let save = SaveServiceSystemUseCase::new(w.uow.clone()).unwrap();

        let first = save
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation: dec!(50.00),
            })
            .await
            .unwrap();
        assert_service_inactive(&first);

        let second = save
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.erp.id(),
                allocation: dec!(50.00),
            })
            .await
            .unwrap();
        assert_service_active(&second);

        let stored = w.uow.services().unwrap().find(w.service.id()).await.unwrap().unwrap();
        assert_service_active(&stored);
        assert_eq!(stored.systems().len(), 2);
        assert_eq!(stored.service_system(w.crm.id()).unwrap().amount(), dec!(600.00));
    }

    #[tokio::test]
    async fn test_saving_again_changes_the_allocation() {
        let w = world().await;
        let save = SaveServiceSystemUseCase::new(w.uow.clone()).unwrap();
        for allocation in [dec!(100), dec!(40)] {
            save.execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation,
            })
            .await
            .unwrap();
        }

        let stored = w.uow.services().unwrap().find(w.service.id()).await.unwrap().unwrap();
        assert_eq!(stored.systems().len(), 1);
        assert_eq!(stored.total_allocation(), dec!(40));
        assert_service_inactive(&stored);
    }

    #[tokio::test]
    async fn test_missing_system_is_reported() {
        let w = world().await;
        let system_id = SystemId::new();

        let result = SaveServiceSystemUseCase::new(w.uow.clone()).unwrap()
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id,
                allocation: dec!(10),
            })
            .await;
        assert_error_message(result, &format!("System ID #{} not found", system_id.as_uuid()));
    }

    #[tokio::test]
    async fn test_over_allocation_is_a_validation_error() {
        let w = world().await;
        let save = SaveServiceSystemUseCase::new(w.uow.clone()).unwrap();
        save.execute(SaveServiceSystemInput {
            service_id: w.service.id(),
            system_id: w.crm.id(),
            allocation: dec!(70),
        })
        .await
        .unwrap();

        let err = save
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.erp.id(),
                allocation: dec!(40),
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_removing_a_system_drops_its_users_list() {
        let w = world().await;
        SaveServiceSystemUseCase::new(w.uow.clone()).unwrap()
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation: dec!(100),
            })
            .await
            .unwrap();
        SaveUsersListItemUseCase::new(w.uow.clone()).unwrap()
            .execute(SaveUsersListItemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                item: UsersListFixtures::item_data("Ana", "ana@corp.com"),
            })
            .await
            .unwrap();

        let service = RemoveServiceSystemUseCase::new(w.uow.clone()).unwrap()
            .execute(RemoveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
            })
            .await
            .unwrap();

        assert_service_inactive(&service);
        assert!(service.systems().is_empty());
        assert!(w.uow.users_lists().unwrap().find_by_service(w.service.id()).await.unwrap().is_none());
    }
}

mod delete_service_tests {
    use super::*;
    use async_trait::async_trait;
    use core_kernel::AgreementId;
    use domain_agreement::ServiceRepository;
    use infra_db::memory::MemoryServiceRepository;
    use infra_db::memory_registry;

    #[tokio::test]
    async fn test_missing_service_message() {
        let w = world().await;
        let id = ServiceId::new();

        let result = DeleteServiceUseCase::new(w.uow.clone()).unwrap().execute(id).await;
        assert_error_message(result, &format!("Service ID #{} not found", id.as_uuid()));
    }

    #[tokio::test]
    async fn test_users_list_is_deleted_with_the_service() {
        let w = world().await;
        SaveServiceSystemUseCase::new(w.uow.clone()).unwrap()
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation: dec!(100),
            })
            .await
            .unwrap();
        SaveUsersListItemUseCase::new(w.uow.clone()).unwrap()
            .execute(SaveUsersListItemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                item: UsersListFixtures::random_item_data(),
            })
            .await
            .unwrap();

        DeleteServiceUseCase::new(w.uow.clone()).unwrap().execute(w.service.id()).await.unwrap();

        assert!(w.uow.services().unwrap().find(w.service.id()).await.unwrap().is_none());
        assert!(w.uow.users_lists().unwrap().find_by_system(w.crm.id()).await.unwrap().is_empty());
    }

    /// Service repository whose deletes always fail
    struct FailingDeletes(MemoryServiceRepository);

    #[async_trait]
    impl ServiceRepository for FailingDeletes {
        async fn insert(&self, service: &Service) -> Result<(), StorageError> {
            self.0.insert(service).await
        }

        async fn update(&self, service: &Service) -> Result<(), StorageError> {
            self.0.update(service).await
        }

        async fn delete(&self, _id: ServiceId) -> Result<(), StorageError> {
            Err(StorageError::Query {
                message: "service delete failed".to_string(),
            })
        }

        async fn find(&self, id: ServiceId) -> Result<Option<Service>, StorageError> {
            self.0.find(id).await
        }

        async fn find_by_agreement(&self, agreement_id: AgreementId) -> Result<Vec<Service>, StorageError> {
            self.0.find_by_agreement(agreement_id).await
        }
    }

    #[tokio::test]
    async fn test_failed_service_delete_keeps_the_users_list() {
        let w = world().await;
        SaveServiceSystemUseCase::new(w.uow.clone())
            .unwrap()
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation: dec!(100),
            })
            .await
            .unwrap();
        SaveUsersListItemUseCase::new(w.uow.clone())
            .unwrap()
            .execute(SaveUsersListItemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                item: UsersListFixtures::item_data("Ana", "ana@corp.com"),
            })
            .await
            .unwrap();

        let failing = UnitOfWork::new(
            w.uow.handle().clone(),
            memory_registry().services(|handle| FailingDeletes(MemoryServiceRepository::new(handle))),
        );
        let err = DeleteServiceUseCase::new(failing)
            .unwrap()
            .execute(w.service.id())
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Storage(StorageError::Query { .. })));

        let list = w.uow.users_lists().unwrap().find_by_service(w.service.id()).await.unwrap();
        assert_eq!(list.map(|l| l.users_number()), Some(1));
        assert!(w.uow.services().unwrap().find(w.service.id()).await.unwrap().is_some());
    }
}

mod agreement_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_requires_existing_plans() {
        let w = world().await;
        let ghost = CatalogFixtures::plan("GHOST");
        let mut input = CreateAgreementInput {
            code: "AG-2026".to_string(),
            year: 2026,
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            provider_plan_id: w.plan.id(),
            local_plan_id: ghost.id(),
        };

        let result = CreateAgreementUseCase::new(w.uow.clone()).unwrap().execute(input.clone()).await;
        assert_error_message(result, &format!("Plan ID #{} not found", ghost.id().as_uuid()));

        input.local_plan_id = w.plan.id();
        let created = CreateAgreementUseCase::new(w.uow.clone()).unwrap().execute(input).await.unwrap();
        assert_eq!(created.revision(), 0);
        assert_eq!(w.uow.agreements().unwrap().find_by_year(2026).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revision_copies_services() {
        let w = world().await;
        SaveServiceSystemUseCase::new(w.uow.clone()).unwrap()
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation: dec!(100),
            })
            .await
            .unwrap();

        let next = ReviseAgreementUseCase::new(w.uow.clone()).unwrap().execute(w.agreement.id()).await.unwrap();

        assert_eq!(next.revision(), 1);
        let previous = w.uow.agreements().unwrap().find(w.agreement.id()).await.unwrap().unwrap();
        assert!(previous.is_revised());

        let copies = w.uow.services().unwrap().find_by_agreement(next.id()).await.unwrap();
        assert_eq!(copies.len(), 1);
        assert_ne!(copies[0].id(), w.service.id());
        assert_eq!(copies[0].status(), ServiceStatus::Created);
        assert_service_active(&copies[0]);
    }

    #[tokio::test]
    async fn test_failed_revision_rolls_back() {
        let w = world().await;
        // Occupies code/year/revision 1 so inserting the successor fails
        let squatter = Agreement::restore(
            core_kernel::AgreementId::new(),
            w.agreement.code().to_string(),
            w.agreement.year(),
            1,
            w.agreement.start_date(),
            w.agreement.end_date(),
            w.plan.id(),
            w.plan.id(),
            false,
        );
        w.uow.agreements().unwrap().insert(&squatter).await.unwrap();

        let err = ReviseAgreementUseCase::new(w.uow.clone()).unwrap()
            .execute(w.agreement.id())
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Storage(StorageError::UniqueViolation { .. })));

        let stored = w.uow.agreements().unwrap().find(w.agreement.id()).await.unwrap().unwrap();
        assert!(!stored.is_revised());
        assert_eq!(w.uow.agreements().unwrap().find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_revised_agreement_takes_no_new_services() {
        let w = world().await;
        ReviseAgreementUseCase::new(w.uow.clone()).unwrap().execute(w.agreement.id()).await.unwrap();

        let err = CreateServiceUseCase::new(w.uow.clone()).unwrap()
            .execute(CreateServiceInput {
                agreement_id: w.agreement.id(),
                details: AgreementFixtures::service_details(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Agreement AG-2025 revision 0 has been revised and can no longer change"
        );
    }

    #[tokio::test]
    async fn test_services_of_a_revised_agreement_are_frozen() {
        let w = world().await;
        let admin = add_user(&w.uow, CatalogFixtures::admin()).await;
        let next = ReviseAgreementUseCase::new(w.uow.clone())
            .unwrap()
            .execute(w.agreement.id())
            .await
            .unwrap();
        let frozen = "Agreement AG-2025 revision 0 has been revised and can no longer change";

        let save = SaveServiceSystemUseCase::new(w.uow.clone()).unwrap();
        let result = save
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation: dec!(100),
            })
            .await;
        assert_error_message(result, frozen);

        let result = RemoveServiceSystemUseCase::new(w.uow.clone())
            .unwrap()
            .execute(RemoveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
            })
            .await;
        assert_error_message(result, frozen);

        let result = ChangeServiceStatusUseCase::new(w.uow.clone())
            .unwrap()
            .execute(ChangeServiceStatusInput {
                service_id: w.service.id(),
                actor_id: admin.id(),
                action: ServiceAction::Assign,
            })
            .await;
        assert_error_message(result, frozen);

        let result = DeleteServiceUseCase::new(w.uow.clone())
            .unwrap()
            .execute(w.service.id())
            .await;
        assert_error_message(result, frozen);
        assert!(w.uow.services().unwrap().find(w.service.id()).await.unwrap().is_some());

        let copies = w.uow.services().unwrap().find_by_agreement(next.id()).await.unwrap();
        let copy = save
            .execute(SaveServiceSystemInput {
                service_id: copies[0].id(),
                system_id: w.crm.id(),
                allocation: dec!(100),
            })
            .await
            .unwrap();
        assert_service_active(&copy);
    }
}

mod status_tests {
    use super::*;

    fn input(service_id: ServiceId, actor: &User, action: ServiceAction) -> ChangeServiceStatusInput {
        ChangeServiceStatusInput {
            service_id,
            actor_id: actor.id(),
            action,
        }
    }

    #[tokio::test]
    async fn test_viewer_cannot_approve() {
        let w = world().await;
        let viewer = add_user(&w.uow, CatalogFixtures::viewer()).await;
        let change = ChangeServiceStatusUseCase::new(w.uow.clone()).unwrap();
        change.execute(input(w.service.id(), &viewer, ServiceAction::Assign)).await.unwrap();

        let result = change.execute(input(w.service.id(), &viewer, ServiceAction::Approve)).await;
        assert_error_message(
            result,
            "User viewer@agreements.test with role viewer cannot validate services",
        );
    }

    #[tokio::test]
    async fn test_validator_approves_assigned_service() {
        let w = world().await;
        let admin = add_user(&w.uow, CatalogFixtures::admin()).await;
        let validator = add_user(&w.uow, CatalogFixtures::validator()).await;
        let change = ChangeServiceStatusUseCase::new(w.uow.clone()).unwrap();

        let early = change.execute(input(w.service.id(), &validator, ServiceAction::Approve)).await;
        assert!(early.unwrap_err().is_validation());

        change.execute(input(w.service.id(), &admin, ServiceAction::Assign)).await.unwrap();
        let approved = change
            .execute(input(w.service.id(), &validator, ServiceAction::Approve))
            .await
            .unwrap();
        assert_eq!(approved.status(), ServiceStatus::Approved);

        let stored = w.uow.services().unwrap().find(w.service.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), ServiceStatus::Approved);
    }

    #[test]
    fn test_actions_deserialize_from_snake_case() {
        let action: ServiceAction = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(action, ServiceAction::Reject);
    }
}

mod users_list_tests {
    use super::*;

    async fn with_crm(w: &World) {
        SaveServiceSystemUseCase::new(w.uow.clone()).unwrap()
            .execute(SaveServiceSystemInput {
                service_id: w.service.id(),
                system_id: w.crm.id(),
                allocation: dec!(60),
            })
            .await
            .unwrap();
    }

    fn item(w: &World, system_id: SystemId, email: &str) -> SaveUsersListItemInput {
        SaveUsersListItemInput {
            service_id: w.service.id(),
            system_id,
            item: UsersListFixtures::item_data("Ana", email),
        }
    }

    #[tokio::test]
    async fn test_first_item_creates_the_list() {
        let w = world().await;
        with_crm(&w).await;
        let save = SaveUsersListItemUseCase::new(w.uow.clone()).unwrap();

        let list = save.execute(item(&w, w.crm.id(), " Ana@Corp.com ")).await.unwrap();
        assert_eq!(list.system_id(), w.crm.id());
        assert_eq!(list.year(), w.agreement.year());
        assert_eq!(list.revision(), w.agreement.revision());
        assert_eq!(list.items()[0].email(), "ana@corp.com");

        let list = save.execute(item(&w, w.crm.id(), "bo@corp.com")).await.unwrap();
        assert_eq!(list.users_number(), 2);
        let stored = w.uow.users_lists().unwrap().find_by_service(w.service.id()).await.unwrap().unwrap();
        assert_eq!(stored.users_number(), 2);
        assert_eq!(stored.id(), list.id());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let w = world().await;
        with_crm(&w).await;
        let save = SaveUsersListItemUseCase::new(w.uow.clone()).unwrap();
        save.execute(item(&w, w.crm.id(), "ana@corp.com")).await.unwrap();

        let result = save.execute(item(&w, w.crm.id(), "ANA@corp.com")).await;
        assert_error_message(result, "ana@corp.com is already in the users list");
    }

    #[tokio::test]
    async fn test_system_must_be_assigned_to_service() {
        let w = world().await;
        with_crm(&w).await;

        let err = SaveUsersListItemUseCase::new(w.uow.clone()).unwrap()
            .execute(item(&w, w.erp.id(), "ana@corp.com"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(w.uow.users_lists().unwrap().find_by_service(w.service.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_item() {
        let w = world().await;
        with_crm(&w).await;
        let list = SaveUsersListItemUseCase::new(w.uow.clone()).unwrap()
            .execute(item(&w, w.crm.id(), "ana@corp.com"))
            .await
            .unwrap();
        let item_id = list.items()[0].id();
        let remove = RemoveUsersListItemUseCase::new(w.uow.clone()).unwrap();

        let list = remove
            .execute(RemoveUsersListItemInput {
                service_id: w.service.id(),
                item_id,
            })
            .await
            .unwrap();
        assert!(list.is_empty());

        let again = remove
            .execute(RemoveUsersListItemInput {
                service_id: w.service.id(),
                item_id,
            })
            .await;
        assert_error_message(again, &format!("Users list item ID #{} not found", item_id.as_uuid()));
    }
}

mod configuration_tests {
    use super::*;
    use infra_db::memory::MemoryServiceRepository;
    use infra_db::RepositoryRegistry;

    #[test]
    fn test_missing_repositories_fail_at_construction() {
        let registry = RepositoryRegistry::new().services(MemoryServiceRepository::new);
        let uow = UnitOfWork::new(MemoryHandle::new(), registry);

        let err = match DeleteServiceUseCase::new(uow.clone()) {
            Ok(_) => panic!("Expected missing repositories"),
            Err(err) => err,
        };
        assert_eq!(
            err.to_string(),
            "Repositories not registered: AgreementRepository, UsersListRepository"
        );
        let err: UseCaseError = err.into();
        assert!(matches!(err, UseCaseError::Configuration(_)));

        assert!(RemoveUsersListItemUseCase::new(uow).is_err());
    }

    #[test]
    fn test_full_registry_builds_every_use_case() {
        let uow = memory_unit_of_work();
        assert!(CreateAgreementUseCase::new(uow.clone()).is_ok());
        assert!(ReviseAgreementUseCase::new(uow.clone()).is_ok());
        assert!(CreateServiceUseCase::new(uow.clone()).is_ok());
        assert!(DeleteServiceUseCase::new(uow.clone()).is_ok());
        assert!(SaveServiceSystemUseCase::new(uow.clone()).is_ok());
        assert!(RemoveServiceSystemUseCase::new(uow.clone()).is_ok());
        assert!(ChangeServiceStatusUseCase::new(uow.clone()).is_ok());
        assert!(SaveUsersListItemUseCase::new(uow.clone()).is_ok());
        assert!(RemoveUsersListItemUseCase::new(uow).is_ok());
    }
}
