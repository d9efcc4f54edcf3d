//! Tables of the in-memory store and their constraints

use std::collections::BTreeMap;

use core_kernel::{AgreementId, PlanId, ServiceId, StorageError, SystemId, UserId, UsersListId};
use domain_agreement::{normalize_email, Agreement, Plan, Service, System, User, UsersList};

/// Every table of the in-memory store
///
/// Maps are keyed by time-ordered ids, so iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub plans: BTreeMap<PlanId, Plan>,
    pub systems: BTreeMap<SystemId, System>,
    pub users: BTreeMap<UserId, User>,
    pub agreements: BTreeMap<AgreementId, Agreement>,
    pub services: BTreeMap<ServiceId, Service>,
    pub users_lists: BTreeMap<UsersListId, UsersList>,
}

impl MemoryState {
    pub(crate) fn insert_plan(&mut self, plan: &Plan) -> Result<(), StorageError> {
        if self.plans.contains_key(&plan.id()) {
            return Err(StorageError::unique("Plan", "id", plan.id()));
        }
        self.check_plan_code(plan)?;
        self.plans.insert(plan.id(), plan.clone());
        Ok(())
    }

    pub(crate) fn update_plan(&mut self, plan: &Plan) -> Result<(), StorageError> {
        if self.plans.contains_key(&plan.id()) {
            self.check_plan_code(plan)?;
            self.plans.insert(plan.id(), plan.clone());
        }
        Ok(())
    }

    pub(crate) fn delete_plan(&mut self, id: PlanId) -> Result<(), StorageError> {
        if let Some(agreement) = self
            .agreements
            .values()
            .find(|a| a.provider_plan_id() == id || a.local_plan_id() == id)
        {
            return Err(referenced("Plan", id, "Agreement", agreement.id()));
        }
        self.plans.remove(&id);
        Ok(())
    }

    fn check_plan_code(&self, plan: &Plan) -> Result<(), StorageError> {
        if self.plans.values().any(|p| p.id() != plan.id() && p.code() == plan.code()) {
            return Err(StorageError::unique("Plan", "code", plan.code()));
        }
        Ok(())
    }

    pub(crate) fn insert_system(&mut self, system: &System) -> Result<(), StorageError> {
        if self.systems.contains_key(&system.id()) {
            return Err(StorageError::unique("System", "id", system.id()));
        }
        self.systems.insert(system.id(), system.clone());
        Ok(())
    }

    pub(crate) fn update_system(&mut self, system: &System) -> Result<(), StorageError> {
        if let Some(stored) = self.systems.get_mut(&system.id()) {
            *stored = system.clone();
        }
        Ok(())
    }

    pub(crate) fn delete_system(&mut self, id: SystemId) -> Result<(), StorageError> {
        if let Some(service) = self.services.values().find(|s| s.has_system(id)) {
            return Err(referenced("System", id, "Service", service.id()));
        }
        if let Some(list) = self.users_lists.values().find(|l| l.system_id() == id) {
            return Err(referenced("System", id, "UsersList", list.id()));
        }
        self.systems.remove(&id);
        Ok(())
    }

    pub(crate) fn insert_user(&mut self, user: &User) -> Result<(), StorageError> {
        if self.users.contains_key(&user.id()) {
            return Err(StorageError::unique("User", "id", user.id()));
        }
        self.check_user_email(user)?;
        self.users.insert(user.id(), user.clone());
        Ok(())
    }

    pub(crate) fn update_user(&mut self, user: &User) -> Result<(), StorageError> {
        if self.users.contains_key(&user.id()) {
            self.check_user_email(user)?;
            self.users.insert(user.id(), user.clone());
        }
        Ok(())
    }

    pub(crate) fn find_user_by_email(&self, email: &str) -> Option<&User> {
        let email = normalize_email(email);
        self.users.values().find(|u| normalize_email(u.email()) == email)
    }

    fn check_user_email(&self, user: &User) -> Result<(), StorageError> {
        match self.find_user_by_email(user.email()) {
            Some(existing) if existing.id() != user.id() => {
                Err(StorageError::unique("User", "email", user.email()))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn insert_agreement(&mut self, agreement: &Agreement) -> Result<(), StorageError> {
        if self.agreements.contains_key(&agreement.id()) {
            return Err(StorageError::unique("Agreement", "id", agreement.id()));
        }
        self.check_agreement(agreement)?;
        self.agreements.insert(agreement.id(), agreement.clone());
        Ok(())
    }

    pub(crate) fn update_agreement(&mut self, agreement: &Agreement) -> Result<(), StorageError> {
        if self.agreements.contains_key(&agreement.id()) {
            self.check_agreement(agreement)?;
            self.agreements.insert(agreement.id(), agreement.clone());
        }
        Ok(())
    }

    pub(crate) fn delete_agreement(&mut self, id: AgreementId) -> Result<(), StorageError> {
        if let Some(service) = self.services.values().find(|s| s.agreement_id() == id) {
            return Err(referenced("Agreement", id, "Service", service.id()));
        }
        self.agreements.remove(&id);
        Ok(())
    }

    fn check_agreement(&self, agreement: &Agreement) -> Result<(), StorageError> {
        for plan_id in [agreement.provider_plan_id(), agreement.local_plan_id()] {
            if !self.plans.contains_key(&plan_id) {
                return Err(StorageError::foreign_key("Agreement", "Plan", plan_id));
            }
        }
        let clash = self.agreements.values().any(|a| {
            a.id() != agreement.id()
                && a.code() == agreement.code()
                && a.year() == agreement.year()
                && a.revision() == agreement.revision()
        });
        if clash {
            return Err(StorageError::unique(
                "Agreement",
                "code/year/revision",
                format!("{}/{}/{}", agreement.code(), agreement.year(), agreement.revision()),
            ));
        }
        Ok(())
    }

    pub(crate) fn insert_service(&mut self, service: &Service) -> Result<(), StorageError> {
        if self.services.contains_key(&service.id()) {
            return Err(StorageError::unique("Service", "id", service.id()));
        }
        self.check_service(service)?;
        self.services.insert(service.id(), service.clone());
        Ok(())
    }

    pub(crate) fn update_service(&mut self, service: &Service) -> Result<(), StorageError> {
        if self.services.contains_key(&service.id()) {
            self.check_service(service)?;
            self.services.insert(service.id(), service.clone());
        }
        Ok(())
    }

    pub(crate) fn delete_service(&mut self, id: ServiceId) -> Result<(), StorageError> {
        if let Some(list) = self.users_lists.values().find(|l| l.service_id() == id) {
            return Err(referenced("Service", id, "UsersList", list.id()));
        }
        self.services.remove(&id);
        Ok(())
    }

    fn check_service(&self, service: &Service) -> Result<(), StorageError> {
        if !self.agreements.contains_key(&service.agreement_id()) {
            return Err(StorageError::foreign_key("Service", "Agreement", service.agreement_id()));
        }
        for association in service.systems() {
            if !self.systems.contains_key(&association.system_id()) {
                return Err(StorageError::foreign_key("ServiceSystem", "System", association.system_id()));
            }
        }
        Ok(())
    }

    pub(crate) fn insert_users_list(&mut self, list: &UsersList) -> Result<(), StorageError> {
        if self.users_lists.contains_key(&list.id()) {
            return Err(StorageError::unique("UsersList", "id", list.id()));
        }
        self.check_users_list(list)?;
        self.users_lists.insert(list.id(), list.clone());
        Ok(())
    }

    pub(crate) fn update_users_list(&mut self, list: &UsersList) -> Result<(), StorageError> {
        if self.users_lists.contains_key(&list.id()) {
            self.check_users_list(list)?;
            self.users_lists.insert(list.id(), list.clone());
        }
        Ok(())
    }

    pub(crate) fn find_users_list_by_service(&self, service_id: ServiceId) -> Option<&UsersList> {
        self.users_lists.values().find(|l| l.service_id() == service_id)
    }

    fn check_users_list(&self, list: &UsersList) -> Result<(), StorageError> {
        if !self.services.contains_key(&list.service_id()) {
            return Err(StorageError::foreign_key("UsersList", "Service", list.service_id()));
        }
        if !self.systems.contains_key(&list.system_id()) {
            return Err(StorageError::foreign_key("UsersList", "System", list.system_id()));
        }
        match self.find_users_list_by_service(list.service_id()) {
            Some(existing) if existing.id() != list.id() => Err(StorageError::unique(
                "UsersList",
                "service_id",
                list.service_id(),
            )),
            _ => Ok(()),
        }
    }
}

fn referenced(
    entity: &str,
    id: impl std::fmt::Display,
    by: &str,
    by_id: impl std::fmt::Display,
) -> StorageError {
    StorageError::ForeignKeyViolation {
        message: format!("{} {} is still referenced by {} {}", entity, id, by, by_id),
    }
}
