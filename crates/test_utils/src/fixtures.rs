//! Pre-built Test Fixtures
//!
//! Ready-to-use entities for the agreement domain. Fixed values keep
//! assertions predictable; the `random_*` helpers use `fake` where a test
//! only needs distinct plausible data.

use chrono::NaiveDate;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal_macros::dec;

use core_kernel::{AgreementId, Currency};
use domain_agreement::{
    Agreement, AgreementTerms, Plan, ServiceDetails, System, User, UserRole, UsersListItem,
    UsersListItemData,
};

/// Fixture for calendar data
pub struct DateFixtures;

impl DateFixtures {
    /// First day of the agreement year (Jan 1, 2025)
    pub fn year_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
    }

    /// Last day of the agreement year (Dec 31, 2025)
    pub fn year_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid date")
    }
}

/// Fixture for catalog entities
pub struct CatalogFixtures;

impl CatalogFixtures {
    /// The BP25 budget plan
    pub fn plan_bp25() -> Plan {
        Plan::create("BP25", "Budget plan 2025", dec!(250000.00), DateFixtures::year_start())
            .expect("valid plan")
    }

    pub fn plan(code: &str) -> Plan {
        Plan::create(code, "Budget plan", dec!(1000), DateFixtures::year_start()).expect("valid plan")
    }

    pub fn system(name: &str) -> System {
        System::create(name, "Line of business application", &format!("APP-{}", name), 50)
    }

    pub fn admin() -> User {
        User::create("admin@agreements.test", "Admin", UserRole::Admin).expect("valid user")
    }

    pub fn validator() -> User {
        User::create("validator@agreements.test", "Validator", UserRole::Validator).expect("valid user")
    }

    pub fn viewer() -> User {
        User::create("viewer@agreements.test", "Viewer", UserRole::Viewer).expect("valid user")
    }
}

/// Fixture for agreements and services
pub struct AgreementFixtures;

impl AgreementFixtures {
    /// 2025 terms using one plan on both sides
    pub fn terms(plan: &Plan) -> AgreementTerms {
        AgreementTerms {
            code: "AG-2025".to_string(),
            year: 2025,
            start_date: DateFixtures::year_start(),
            end_date: DateFixtures::year_end(),
            provider_plan_id: plan.id(),
            local_plan_id: plan.id(),
        }
    }

    pub fn agreement(plan: &Plan) -> Agreement {
        Agreement::create(Self::terms(plan)).expect("valid agreement")
    }

    /// Hosting service costing 1200 EUR split evenly between plans
    pub fn service_details() -> ServiceDetails {
        ServiceDetails {
            name: "Hosting".to_string(),
            description: "Managed hosting".to_string(),
            run_amount: dec!(1000.00),
            change_amount: dec!(200.00),
            currency: Currency::EUR,
            responsible_email: "owner@agreements.test".to_string(),
            provider_allocation: dec!(50),
            local_allocation: dec!(50),
        }
    }

    pub fn service(agreement_id: AgreementId) -> domain_agreement::Service {
        domain_agreement::Service::create(agreement_id, Self::service_details()).expect("valid service")
    }
}

/// Fixture for users list data
pub struct UsersListFixtures;

impl UsersListFixtures {
    pub fn item_data(name: &str, email: &str) -> UsersListItemData {
        UsersListItemData {
            name: name.to_string(),
            email: email.to_string(),
            corp_user_id: "C0001".to_string(),
            area: "IT".to_string(),
            cost_center: "CC-100".to_string(),
        }
    }

    /// Item with a fake name and email
    pub fn random_item_data() -> UsersListItemData {
        UsersListItemData {
            name: Name().fake(),
            email: SafeEmail().fake(),
            corp_user_id: format!("C{:04}", (0..10_000u32).fake::<u32>()),
            area: "Operations".to_string(),
            cost_center: "CC-200".to_string(),
        }
    }

    pub fn random_item() -> UsersListItem {
        UsersListItem::create(Self::random_item_data()).expect("valid item")
    }
}
