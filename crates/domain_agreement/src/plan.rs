//! Plan entity
//!
//! A plan is the yearly budget reference that agreements point to, once for
//! the provider side and once for the local side.

use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{compare_amounts, PlanId};

use crate::error::DomainError;

/// A budget plan with a euro value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    id: PlanId,
    code: String,
    description: String,
    euro: Decimal,
    plan_date: NaiveDate,
}

impl Plan {
    /// Creates a new plan with a fresh identity
    pub fn create(
        code: &str,
        description: &str,
        euro: Decimal,
        plan_date: NaiveDate,
    ) -> Result<Self, DomainError> {
        let plan = Self {
            id: PlanId::new(),
            code: code.trim().to_string(),
            description: description.trim().to_string(),
            euro,
            plan_date,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Rebuilds a plan from its stored shape
    pub fn restore(
        id: PlanId,
        code: String,
        description: String,
        euro: Decimal,
        plan_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            code,
            description,
            euro,
            plan_date,
        }
    }

    pub fn id(&self) -> PlanId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn euro(&self) -> Decimal {
        self.euro
    }

    pub fn plan_date(&self) -> NaiveDate {
        self.plan_date
    }

    /// Replaces every editable field, keeping the identity
    pub fn update(
        &mut self,
        code: &str,
        description: &str,
        euro: Decimal,
        plan_date: NaiveDate,
    ) -> Result<(), DomainError> {
        let mut updated = self.clone();
        updated.code = code.trim().to_string();
        updated.description = description.trim().to_string();
        updated.euro = euro;
        updated.plan_date = plan_date;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Orders this plan's euro value against an amount, ignoring decimal scale
    pub fn compare_euro(&self, euro: Decimal) -> Ordering {
        compare_amounts(self.euro, euro)
    }

    /// Returns true when both plans hold the same persisted values
    ///
    /// The euro value is compared numerically so `100.0` and `100.00` match.
    pub fn same_values(&self, other: &Plan) -> bool {
        self.id == other.id
            && self.code == other.code
            && self.description == other.description
            && self.plan_date == other.plan_date
            && self.compare_euro(other.euro) == Ordering::Equal
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.code.is_empty() {
            return Err(DomainError::validation("Plan code is required"));
        }
        if self.euro.is_sign_negative() && !self.euro.is_zero() {
            return Err(DomainError::validation(format!(
                "Plan {} euro value cannot be negative",
                self.code
            )));
        }
        Ok(())
    }
}
