//! PostgreSQL Integration Tests
//!
//! Run the repositories and the unit of work against a real server started
//! in a container. Ignored by default; run with `--ignored` where Docker is
//! available.

use rust_decimal_macros::dec;

use core_kernel::StorageError;
use domain_agreement::UserRole;
use infra_db::UnitOfWorkError;
use test_utils::{
    assert_same_plan, assert_service_active, get_shared_test_database, AgreementFixtures,
    CatalogFixtures, TestServiceBuilder, TestUsersListBuilder, UsersListFixtures,
};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_plan_round_trip() {
    let db = get_shared_test_database().await;
    db.clear_data().await.unwrap();
    let uow = db.unit_of_work();

    let plan = CatalogFixtures::plan_bp25();
    uow.plans().unwrap().insert(&plan).await.unwrap();

    let found = uow.plans().unwrap().find_by_code("BP25").await.unwrap().unwrap();
    assert_same_plan(&found, &plan);
    assert_eq!(found.euro(), dec!(250000.00));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_email_maps_to_unique_violation() {
    let db = get_shared_test_database().await;
    db.clear_data().await.unwrap();
    let users = db.unit_of_work().users().unwrap();

    users.insert(&CatalogFixtures::admin()).await.unwrap();
    let duplicate =
        domain_agreement::User::create("ADMIN@agreements.test", "Other", UserRole::Viewer).unwrap();

    let err = users.insert(&duplicate).await.unwrap_err();
    assert!(matches!(err, StorageError::UniqueViolation { .. }));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_service_and_users_list_round_trip() {
    let db = get_shared_test_database().await;
    db.clear_data().await.unwrap();
    let uow = db.unit_of_work();

    let plan = CatalogFixtures::plan_bp25();
    let agreement = AgreementFixtures::agreement(&plan);
    let crm = CatalogFixtures::system("CRM");
    let erp = CatalogFixtures::system("ERP");
    let service = TestServiceBuilder::new(agreement.id())
        .with_system(crm.id(), dec!(50.00))
        .with_system(erp.id(), dec!(50.00))
        .build();
    let list = TestUsersListBuilder::new(service.id(), crm.id())
        .with_item(UsersListFixtures::item_data("Ana", "ana@corp.com"))
        .build();

    let stored = service.clone();
    uow.execute(move |uow| {
        Box::pin(async move {
            uow.plans()?.insert(&plan).await?;
            uow.agreements()?.insert(&agreement).await?;
            uow.systems()?.insert(&crm).await?;
            uow.systems()?.insert(&erp).await?;
            uow.services()?.insert(&stored).await?;
            uow.users_lists()?.insert(&list).await?;
            Ok::<_, UnitOfWorkError>(())
        })
    })
    .await
    .unwrap();

    let found = uow.services().unwrap().find(service.id()).await.unwrap().unwrap();
    assert_eq!(found, service);
    assert_service_active(&found);

    let found_list = uow.users_lists().unwrap().find_by_service(service.id()).await.unwrap().unwrap();
    assert_eq!(found_list.users_number(), 1);
    assert_eq!(found_list.items()[0].email(), "ana@corp.com");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_work_rolls_back() {
    let db = get_shared_test_database().await;
    db.clear_data().await.unwrap();
    let uow = db.unit_of_work();
    let plan = CatalogFixtures::plan("RB01");
    let id = plan.id();

    let result = uow
        .execute(move |uow| {
            Box::pin(async move {
                uow.plans()?.insert(&plan).await?;
                uow.plans()?.insert(&plan).await?;
                Ok::<_, UnitOfWorkError>(())
            })
        })
        .await;

    assert!(result.is_err());
    assert!(uow.plans().unwrap().find(id).await.unwrap().is_none());
}
