//! Test Data Builders
//!
//! Builders for aggregates whose tests usually care about one or two fields.
//! Everything else falls back to the values in [`crate::fixtures`].

use chrono::Datelike;
use rust_decimal::Decimal;

use core_kernel::{AgreementId, Currency, PlanId, ServiceId, SystemId};
use domain_agreement::{
    Agreement, Service, ServiceDetails, UsersList, UsersListItem, UsersListItemData,
};

use crate::fixtures::{AgreementFixtures, DateFixtures};

/// Builder for agreements
pub struct TestAgreementBuilder {
    code: String,
    year: i32,
    provider_plan_id: PlanId,
    local_plan_id: PlanId,
}

impl TestAgreementBuilder {
    /// Creates a builder referencing `plan_id` on both sides
    pub fn new(plan_id: PlanId) -> Self {
        Self {
            code: "AG-2025".to_string(),
            year: 2025,
            provider_plan_id: plan_id,
            local_plan_id: plan_id,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_local_plan(mut self, plan_id: PlanId) -> Self {
        self.local_plan_id = plan_id;
        self
    }

    pub fn build(self) -> Agreement {
        let mut terms = AgreementFixtures::terms(&crate::fixtures::CatalogFixtures::plan_bp25());
        terms.code = self.code;
        terms.year = self.year;
        terms.start_date = DateFixtures::year_start()
            .with_year(self.year)
            .unwrap_or_else(DateFixtures::year_start);
        terms.end_date = DateFixtures::year_end()
            .with_year(self.year)
            .unwrap_or_else(DateFixtures::year_end);
        terms.provider_plan_id = self.provider_plan_id;
        terms.local_plan_id = self.local_plan_id;
        Agreement::create(terms).expect("valid agreement")
    }
}

/// Builder for services and their system allocations
pub struct TestServiceBuilder {
    agreement_id: AgreementId,
    details: ServiceDetails,
    systems: Vec<(SystemId, Decimal)>,
}

impl TestServiceBuilder {
    pub fn new(agreement_id: AgreementId) -> Self {
        Self {
            agreement_id,
            details: AgreementFixtures::service_details(),
            systems: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.details.name = name.into();
        self
    }

    pub fn with_amounts(mut self, run: Decimal, change: Decimal) -> Self {
        self.details.run_amount = run;
        self.details.change_amount = change;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.details.currency = currency;
        self
    }

    pub fn with_plan_split(mut self, provider: Decimal, local: Decimal) -> Self {
        self.details.provider_allocation = provider;
        self.details.local_allocation = local;
        self
    }

    /// Adds a system allocation
    pub fn with_system(mut self, system_id: SystemId, allocation: Decimal) -> Self {
        self.systems.push((system_id, allocation));
        self
    }

    pub fn build(self) -> Service {
        let mut service = Service::create(self.agreement_id, self.details).expect("valid service");
        for (system_id, allocation) in self.systems {
            service
                .add_service_system(system_id, allocation)
                .expect("valid allocation");
        }
        service
    }
}

/// Builder for users lists
pub struct TestUsersListBuilder {
    service_id: ServiceId,
    system_id: SystemId,
    year: i32,
    revision: i32,
    items: Vec<UsersListItemData>,
}

impl TestUsersListBuilder {
    pub fn new(service_id: ServiceId, system_id: SystemId) -> Self {
        Self {
            service_id,
            system_id,
            year: 2025,
            revision: 0,
            items: Vec::new(),
        }
    }

    pub fn with_revision(mut self, year: i32, revision: i32) -> Self {
        self.year = year;
        self.revision = revision;
        self
    }

    pub fn with_item(mut self, item: UsersListItemData) -> Self {
        self.items.push(item);
        self
    }

    pub fn build(self) -> UsersList {
        let mut list = UsersList::create(self.service_id, self.system_id, self.year, self.revision);
        for data in self.items {
            list.add_item(UsersListItem::create(data).expect("valid item"))
                .expect("unique email");
        }
        list
    }
}
