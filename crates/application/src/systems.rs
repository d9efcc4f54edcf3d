//! System use cases

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use core_kernel::SystemId;
use domain_agreement::{System, SystemRepository};

use crate::error::UseCaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct SystemInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub application_id: String,
    #[serde(default)]
    pub users: i32,
}

pub struct CreateSystemUseCase {
    systems: Arc<dyn SystemRepository>,
}

impl CreateSystemUseCase {
    pub fn new(systems: Arc<dyn SystemRepository>) -> Self {
        Self { systems }
    }

    #[instrument(skip(self), fields(name = %input.name))]
    pub async fn execute(&self, input: SystemInput) -> Result<System, UseCaseError> {
        let system = System::create(&input.name, &input.description, &input.application_id, input.users);
        system.validate()?;
        self.systems.insert(&system).await?;
        Ok(system)
    }
}

pub struct UpdateSystemUseCase {
    systems: Arc<dyn SystemRepository>,
}

impl UpdateSystemUseCase {
    pub fn new(systems: Arc<dyn SystemRepository>) -> Self {
        Self { systems }
    }

    #[instrument(skip(self, input), fields(system_id = %id))]
    pub async fn execute(&self, id: SystemId, input: SystemInput) -> Result<System, UseCaseError> {
        let mut system = self
            .systems
            .find(id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("System", id.as_uuid()))?;

        system.update(&input.name, &input.description, &input.application_id, input.users);
        system.validate()?;
        self.systems.update(&system).await?;
        Ok(system)
    }
}
