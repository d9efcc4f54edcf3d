//! Service aggregate
//!
//! A service belongs to one agreement and spreads its yearly cost across the
//! systems that consume it. The `ServiceSystem` associations are owned by
//! the service and only persisted through it.
//!
//! # Invariants
//!
//! - At most one association per system id
//! - Each allocation lies within `0..=100` and the allocations never sum
//!   past 100
//! - `is_active` is true exactly when the allocations sum to 100; every
//!   mutating method recomputes it before returning
//! - Association amounts always reflect the current run/change amounts
//! - Run and change amounts stay within `0..=MAX_AMOUNT`, so the cost math
//!   cannot overflow

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{compare_amounts, percentage_of, AgreementId, Currency, Money, ServiceId, SystemId};

use crate::error::DomainError;
use crate::user::{is_plausible_email, normalize_email};

/// Percentage that a service's allocations must reach to be active
pub const FULL_ALLOCATION: Decimal = dec!(100);

/// Largest run or change amount a service accepts
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Service lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Registered, not yet submitted for validation
    Created,
    /// Submitted and waiting for a validator
    Assigned,
    Approved,
    Rejected,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Created => "created",
            ServiceStatus::Assigned => "assigned",
            ServiceStatus::Approved => "approved",
            ServiceStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ServiceStatus::Created),
            "assigned" => Ok(ServiceStatus::Assigned),
            "approved" => Ok(ServiceStatus::Approved),
            "rejected" => Ok(ServiceStatus::Rejected),
            other => Err(DomainError::validation(format!("Unknown service status: {}", other))),
        }
    }
}

/// Share of a service assigned to one system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSystem {
    system_id: SystemId,
    allocation: Decimal,
    amount: Decimal,
}

impl ServiceSystem {
    pub fn system_id(&self) -> SystemId {
        self.system_id
    }

    /// Allocation percentage (0-100)
    pub fn allocation(&self) -> Decimal {
        self.allocation
    }

    /// Part of the service's total cost carried by this system
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Editable fields of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub name: String,
    pub description: String,
    pub run_amount: Decimal,
    pub change_amount: Decimal,
    pub currency: Currency,
    pub responsible_email: String,
    /// Percentage of the cost charged to the provider plan
    pub provider_allocation: Decimal,
    /// Percentage of the cost charged to the local plan
    pub local_allocation: Decimal,
}

/// A contracted service inside an agreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    id: ServiceId,
    agreement_id: AgreementId,
    name: String,
    description: String,
    run_amount: Decimal,
    change_amount: Decimal,
    currency: Currency,
    responsible_email: String,
    provider_allocation: Decimal,
    local_allocation: Decimal,
    status: ServiceStatus,
    is_active: bool,
    systems: Vec<ServiceSystem>,
}

impl Service {
    /// Creates a new service in the `Created` status with no systems
    pub fn create(agreement_id: AgreementId, details: ServiceDetails) -> Result<Self, DomainError> {
        let mut service = Self {
            id: ServiceId::new(),
            agreement_id,
            name: String::new(),
            description: String::new(),
            run_amount: Decimal::ZERO,
            change_amount: Decimal::ZERO,
            currency: details.currency,
            responsible_email: String::new(),
            provider_allocation: Decimal::ZERO,
            local_allocation: Decimal::ZERO,
            status: ServiceStatus::Created,
            is_active: false,
            systems: Vec::new(),
        };
        service.apply_details(details);
        service.validate()?;
        Ok(service)
    }

    /// Rebuilds a service and its associations from their stored shape
    ///
    /// Association amounts and the active flag are recomputed rather than
    /// trusted from storage. Fails when the stored amounts cannot be
    /// allocated.
    pub fn restore(
        id: ServiceId,
        agreement_id: AgreementId,
        details: ServiceDetails,
        status: ServiceStatus,
        systems: Vec<(SystemId, Decimal)>,
    ) -> Result<Self, DomainError> {
        let mut service = Self {
            id,
            agreement_id,
            name: details.name,
            description: details.description,
            run_amount: details.run_amount,
            change_amount: details.change_amount,
            currency: details.currency,
            responsible_email: details.responsible_email,
            provider_allocation: details.provider_allocation,
            local_allocation: details.local_allocation,
            status,
            is_active: false,
            systems: systems
                .into_iter()
                .map(|(system_id, allocation)| ServiceSystem {
                    system_id,
                    allocation,
                    amount: Decimal::ZERO,
                })
                .collect(),
        };
        service.refresh_amounts()?;
        service.change_activation_status_based_on_allocation();
        Ok(service)
    }

    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn agreement_id(&self) -> AgreementId {
        self.agreement_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn run_amount(&self) -> Decimal {
        self.run_amount
    }

    pub fn change_amount(&self) -> Decimal {
        self.change_amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn responsible_email(&self) -> &str {
        &self.responsible_email
    }

    pub fn provider_allocation(&self) -> Decimal {
        self.provider_allocation
    }

    pub fn local_allocation(&self) -> Decimal {
        self.local_allocation
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn systems(&self) -> &[ServiceSystem] {
        &self.systems
    }

    /// Returns the current editable fields
    pub fn details(&self) -> ServiceDetails {
        ServiceDetails {
            name: self.name.clone(),
            description: self.description.clone(),
            run_amount: self.run_amount,
            change_amount: self.change_amount,
            currency: self.currency,
            responsible_email: self.responsible_email.clone(),
            provider_allocation: self.provider_allocation,
            local_allocation: self.local_allocation,
        }
    }

    /// Run plus change amount
    pub fn total_cost(&self) -> Result<Money, DomainError> {
        let run = Money::new(self.run_amount, self.currency);
        Ok(run.checked_add(&Money::new(self.change_amount, self.currency))?)
    }

    /// Part of the total cost charged to the provider plan
    pub fn provider_cost(&self) -> Result<Money, DomainError> {
        Ok(self.total_cost()?.share(self.provider_allocation)?)
    }

    /// Part of the total cost charged to the local plan
    pub fn local_cost(&self) -> Result<Money, DomainError> {
        Ok(self.total_cost()?.share(self.local_allocation)?)
    }

    /// Sum of all system allocations
    pub fn total_allocation(&self) -> Decimal {
        self.systems.iter().map(|s| s.allocation).sum()
    }

    pub fn has_system(&self, system_id: SystemId) -> bool {
        self.systems.iter().any(|s| s.system_id == system_id)
    }

    pub fn service_system(&self, system_id: SystemId) -> Option<&ServiceSystem> {
        self.systems.iter().find(|s| s.system_id == system_id)
    }

    /// Replaces the editable fields and recomputes association amounts
    pub fn update_details(&mut self, details: ServiceDetails) -> Result<(), DomainError> {
        let mut updated = self.clone();
        updated.apply_details(details);
        updated.validate()?;
        updated.refresh_amounts()?;
        updated.change_activation_status_based_on_allocation();
        *self = updated;
        Ok(())
    }

    /// Changes the run and change amounts
    pub fn change_amounts(&mut self, run_amount: Decimal, change_amount: Decimal) -> Result<(), DomainError> {
        let mut details = self.details();
        details.run_amount = run_amount;
        details.change_amount = change_amount;
        self.update_details(details)
    }

    /// Adds a new system association
    pub fn add_service_system(&mut self, system_id: SystemId, allocation: Decimal) -> Result<(), DomainError> {
        if self.has_system(system_id) {
            return Err(DomainError::invalid_allocation(format!(
                "System {} is already assigned to service {}",
                system_id, self.name
            )));
        }
        self.check_allocation(allocation, self.total_allocation())?;

        let amount = self.system_amount(allocation)?;
        self.systems.push(ServiceSystem {
            system_id,
            allocation,
            amount,
        });
        self.change_activation_status_based_on_allocation();
        Ok(())
    }

    /// Changes the allocation of an existing system association
    pub fn change_service_system_allocation(
        &mut self,
        system_id: SystemId,
        allocation: Decimal,
    ) -> Result<(), DomainError> {
        let current = self
            .service_system(system_id)
            .map(|s| s.allocation)
            .ok_or_else(|| {
                DomainError::invalid_allocation(format!(
                    "System {} is not assigned to service {}",
                    system_id, self.name
                ))
            })?;
        self.check_allocation(allocation, self.total_allocation() - current)?;

        let amount = self.system_amount(allocation)?;
        if let Some(association) = self.systems.iter_mut().find(|s| s.system_id == system_id) {
            association.allocation = allocation;
            association.amount = amount;
        }
        self.change_activation_status_based_on_allocation();
        Ok(())
    }

    /// Adds the association, or changes its allocation when it already exists
    pub fn save_service_system(&mut self, system_id: SystemId, allocation: Decimal) -> Result<(), DomainError> {
        if self.has_system(system_id) {
            self.change_service_system_allocation(system_id, allocation)
        } else {
            self.add_service_system(system_id, allocation)
        }
    }

    /// Removes an association, returning whether one existed
    pub fn remove_service_system(&mut self, system_id: SystemId) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.system_id != system_id);
        let removed = self.systems.len() != before;
        self.change_activation_status_based_on_allocation();
        removed
    }

    /// Recomputes `is_active` from the current allocations
    pub fn change_activation_status_based_on_allocation(&mut self) {
        let total = self.total_allocation();
        self.is_active = compare_amounts(total, FULL_ALLOCATION).is_eq();
        debug!(service_id = %self.id, %total, is_active = self.is_active, "activation recomputed");
    }

    /// Submits the service for validation
    pub fn assign(&mut self) -> Result<(), DomainError> {
        match self.status {
            ServiceStatus::Created | ServiceStatus::Rejected => {
                self.status = ServiceStatus::Assigned;
                Ok(())
            }
            other => Err(self.transition_error(other, ServiceStatus::Assigned)),
        }
    }

    pub fn approve(&mut self) -> Result<(), DomainError> {
        match self.status {
            ServiceStatus::Assigned => {
                self.status = ServiceStatus::Approved;
                Ok(())
            }
            other => Err(self.transition_error(other, ServiceStatus::Approved)),
        }
    }

    pub fn reject(&mut self) -> Result<(), DomainError> {
        match self.status {
            ServiceStatus::Assigned => {
                self.status = ServiceStatus::Rejected;
                Ok(())
            }
            other => Err(self.transition_error(other, ServiceStatus::Rejected)),
        }
    }

    /// Copies this service, associations included, into another agreement
    ///
    /// The copy gets a fresh identity and starts over in `Created`.
    pub fn copy_to(&self, agreement_id: AgreementId) -> Service {
        Self {
            id: ServiceId::new(),
            agreement_id,
            status: ServiceStatus::Created,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::validation("Service name is required"));
        }
        if self.run_amount < Decimal::ZERO || self.change_amount < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "Service {} amounts cannot be negative",
                self.name
            )));
        }
        if self.run_amount > MAX_AMOUNT || self.change_amount > MAX_AMOUNT {
            return Err(DomainError::validation(format!(
                "Service {} amounts cannot exceed {}",
                self.name, MAX_AMOUNT
            )));
        }
        if !is_plausible_email(&self.responsible_email) {
            return Err(DomainError::validation(format!(
                "Invalid responsible email: {}",
                self.responsible_email
            )));
        }
        for side in [self.provider_allocation, self.local_allocation] {
            if side < Decimal::ZERO || side > FULL_ALLOCATION {
                return Err(DomainError::invalid_allocation(format!(
                    "Plan allocation must be between 0 and 100, got {}",
                    side
                )));
            }
        }
        if !compare_amounts(self.provider_allocation + self.local_allocation, FULL_ALLOCATION).is_eq() {
            return Err(DomainError::invalid_allocation(format!(
                "Provider and local allocations must sum to 100, got {} + {}",
                self.provider_allocation, self.local_allocation
            )));
        }
        Ok(())
    }

    fn apply_details(&mut self, details: ServiceDetails) {
        self.name = details.name.trim().to_string();
        self.description = details.description.trim().to_string();
        self.run_amount = details.run_amount;
        self.change_amount = details.change_amount;
        self.currency = details.currency;
        self.responsible_email = normalize_email(&details.responsible_email);
        self.provider_allocation = details.provider_allocation;
        self.local_allocation = details.local_allocation;
    }

    fn check_allocation(&self, allocation: Decimal, others: Decimal) -> Result<(), DomainError> {
        if allocation < Decimal::ZERO || allocation > FULL_ALLOCATION {
            return Err(DomainError::invalid_allocation(format!(
                "Allocation must be between 0 and 100, got {}",
                allocation
            )));
        }
        if others + allocation > FULL_ALLOCATION {
            return Err(DomainError::invalid_allocation(format!(
                "Allocations of service {} would reach {}%",
                self.name,
                others + allocation
            )));
        }
        Ok(())
    }

    fn total_amount(&self) -> Result<Decimal, DomainError> {
        self.run_amount.checked_add(self.change_amount).ok_or_else(|| {
            DomainError::validation(format!("Service {} total amount is out of range", self.name))
        })
    }

    fn system_amount(&self, allocation: Decimal) -> Result<Decimal, DomainError> {
        Ok(percentage_of(self.total_amount()?, allocation, self.currency.decimal_places())?)
    }

    fn refresh_amounts(&mut self) -> Result<(), DomainError> {
        let total = self.total_amount()?;
        let dp = self.currency.decimal_places();
        for association in &mut self.systems {
            association.amount = percentage_of(total, association.allocation, dp)?;
        }
        Ok(())
    }

    fn transition_error(&self, from: ServiceStatus, to: ServiceStatus) -> DomainError {
        DomainError::invalid_state(format!(
            "Service {} cannot move from {} to {}",
            self.name, from, to
        ))
    }
}
