//! Agreement aggregate
//!
//! An agreement groups the services contracted for one year. Each revision
//! of an agreement is its own aggregate; the predecessor is flagged as
//! revised once a successor exists.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{AgreementId, PlanId};

use crate::error::DomainError;

/// Editable fields of an agreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementTerms {
    pub code: String,
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub provider_plan_id: PlanId,
    pub local_plan_id: PlanId,
}

/// A yearly service agreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    id: AgreementId,
    code: String,
    year: i32,
    revision: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    provider_plan_id: PlanId,
    local_plan_id: PlanId,
    is_revised: bool,
}

impl Agreement {
    /// Creates revision 0 of a new agreement
    pub fn create(terms: AgreementTerms) -> Result<Self, DomainError> {
        let agreement = Self {
            id: AgreementId::new(),
            code: terms.code.trim().to_string(),
            year: terms.year,
            revision: 0,
            start_date: terms.start_date,
            end_date: terms.end_date,
            provider_plan_id: terms.provider_plan_id,
            local_plan_id: terms.local_plan_id,
            is_revised: false,
        };
        agreement.validate()?;
        Ok(agreement)
    }

    /// Rebuilds an agreement from its stored shape
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: AgreementId,
        code: String,
        year: i32,
        revision: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        provider_plan_id: PlanId,
        local_plan_id: PlanId,
        is_revised: bool,
    ) -> Self {
        Self {
            id,
            code,
            year,
            revision,
            start_date,
            end_date,
            provider_plan_id,
            local_plan_id,
            is_revised,
        }
    }

    pub fn id(&self) -> AgreementId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn revision(&self) -> i32 {
        self.revision
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn provider_plan_id(&self) -> PlanId {
        self.provider_plan_id
    }

    pub fn local_plan_id(&self) -> PlanId {
        self.local_plan_id
    }

    pub fn is_revised(&self) -> bool {
        self.is_revised
    }

    /// Replaces the editable terms; a revised agreement is frozen
    pub fn update(&mut self, terms: AgreementTerms) -> Result<(), DomainError> {
        if self.is_revised {
            return Err(DomainError::invalid_state(format!(
                "Agreement {} revision {} has been revised and can no longer change",
                self.code, self.revision
            )));
        }
        let mut updated = self.clone();
        updated.code = terms.code.trim().to_string();
        updated.year = terms.year;
        updated.start_date = terms.start_date;
        updated.end_date = terms.end_date;
        updated.provider_plan_id = terms.provider_plan_id;
        updated.local_plan_id = terms.local_plan_id;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Builds the successor revision with a fresh identity
    pub fn next_revision(&self) -> Result<Agreement, DomainError> {
        if self.is_revised {
            return Err(DomainError::invalid_state(format!(
                "Agreement {} revision {} already has a successor",
                self.code, self.revision
            )));
        }
        Ok(Self {
            id: AgreementId::new(),
            revision: self.revision + 1,
            is_revised: false,
            ..self.clone()
        })
    }

    pub fn mark_revised(&mut self) {
        self.is_revised = true;
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.code.is_empty() {
            return Err(DomainError::validation("Agreement code is required"));
        }
        if self.revision < 0 {
            return Err(DomainError::validation("Agreement revision cannot be negative"));
        }
        if self.end_date < self.start_date {
            return Err(DomainError::validation(format!(
                "Agreement {} ends ({}) before it starts ({})",
                self.code, self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}
