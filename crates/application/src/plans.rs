//! Plan use cases
//!
//! Plans are a single aggregate, so these use cases talk to the plan
//! repository directly.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use core_kernel::PlanId;
use domain_agreement::{Plan, PlanRepository};

use crate::error::UseCaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct PlanInput {
    pub code: String,
    pub description: String,
    pub euro: Decimal,
    pub plan_date: NaiveDate,
}

pub struct CreatePlanUseCase {
    plans: Arc<dyn PlanRepository>,
}

impl CreatePlanUseCase {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    /// Creates a plan; the code must not be taken
    #[instrument(skip(self), fields(code = %input.code))]
    pub async fn execute(&self, input: PlanInput) -> Result<Plan, UseCaseError> {
        let plan = Plan::create(&input.code, &input.description, input.euro, input.plan_date)?;
        if self.plans.find_by_code(plan.code()).await?.is_some() {
            return Err(UseCaseError::validation(format!(
                "Plan code {} is already in use",
                plan.code()
            )));
        }
        self.plans.insert(&plan).await?;
        Ok(plan)
    }
}

pub struct UpdatePlanUseCase {
    plans: Arc<dyn PlanRepository>,
}

impl UpdatePlanUseCase {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    #[instrument(skip(self, input), fields(plan_id = %id))]
    pub async fn execute(&self, id: PlanId, input: PlanInput) -> Result<Plan, UseCaseError> {
        let mut plan = self
            .plans
            .find(id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("Plan", id.as_uuid()))?;

        if let Some(other) = self.plans.find_by_code(input.code.trim()).await? {
            if other.id() != id {
                return Err(UseCaseError::validation(format!(
                    "Plan code {} is already in use",
                    other.code()
                )));
            }
        }

        plan.update(&input.code, &input.description, input.euro, input.plan_date)?;
        self.plans.update(&plan).await?;
        Ok(plan)
    }
}

pub struct DeletePlanUseCase {
    plans: Arc<dyn PlanRepository>,
}

impl DeletePlanUseCase {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    /// Deletes a plan; a plan still used by an agreement fails in storage
    #[instrument(skip(self), fields(plan_id = %id))]
    pub async fn execute(&self, id: PlanId) -> Result<(), UseCaseError> {
        if self.plans.find(id).await?.is_none() {
            return Err(UseCaseError::not_found("Plan", id.as_uuid()));
        }
        self.plans.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_db::memory::MemoryPlanRepository;
    use infra_db::MemoryHandle;
    use rust_decimal_macros::dec;

    fn input(code: &str) -> PlanInput {
        PlanInput {
            code: code.to_string(),
            description: " Budget ".to_string(),
            euro: dec!(1200.50),
            plan_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    fn repository() -> Arc<dyn PlanRepository> {
        Arc::new(MemoryPlanRepository::new(MemoryHandle::new()))
    }

    #[tokio::test]
    async fn test_create_trims_and_stores() {
        let plans = repository();
        let plan = CreatePlanUseCase::new(plans.clone()).execute(input(" BP25 ")).await.unwrap();

        assert_eq!(plan.code(), "BP25");
        assert_eq!(plan.description(), "Budget");
        assert!(plans.find(plan.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_taken_code() {
        let plans = repository();
        let create = CreatePlanUseCase::new(plans);
        create.execute(input("BP25")).await.unwrap();

        let err = create.execute(input("BP25")).await.unwrap_err();
        assert_eq!(err.to_string(), "Plan code BP25 is already in use");
    }

    #[tokio::test]
    async fn test_update_missing_plan() {
        let id = PlanId::new();
        let err = UpdatePlanUseCase::new(repository())
            .execute(id, input("BP25"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Plan ID #{} not found", id.as_uuid()));
    }

    #[tokio::test]
    async fn test_update_keeps_own_code() {
        let plans = repository();
        let plan = CreatePlanUseCase::new(plans.clone()).execute(input("BP25")).await.unwrap();

        let mut changed = input("BP25");
        changed.euro = dec!(999);
        let updated = UpdatePlanUseCase::new(plans.clone()).execute(plan.id(), changed).await.unwrap();

        assert_eq!(updated.compare_euro(dec!(999.00)), std::cmp::Ordering::Equal);
        assert_eq!(plans.find(plan.id()).await.unwrap().unwrap().euro(), dec!(999));
    }

    #[tokio::test]
    async fn test_delete_plan() {
        let plans = repository();
        let plan = CreatePlanUseCase::new(plans.clone()).execute(input("BP25")).await.unwrap();

        DeletePlanUseCase::new(plans.clone()).execute(plan.id()).await.unwrap();
        assert!(plans.find(plan.id()).await.unwrap().is_none());
        let err = DeletePlanUseCase::new(plans).execute(plan.id()).await.unwrap_err();
        assert!(err.is_validation());
    }
}
