//! System entity
//!
//! A system is an application that consumes services; its cost share is
//! expressed through service allocations.

use serde::{Deserialize, Serialize};

use core_kernel::SystemId;

use crate::error::DomainError;

/// An application registered in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    id: SystemId,
    name: String,
    description: String,
    application_id: String,
    users: i32,
}

impl System {
    /// Creates an unvalidated system; call [`System::validate`] before persisting
    pub fn create(name: &str, description: &str, application_id: &str, users: i32) -> Self {
        Self {
            id: SystemId::new(),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            application_id: application_id.trim().to_string(),
            users,
        }
    }

    /// Rebuilds a system from its stored shape
    pub fn restore(
        id: SystemId,
        name: String,
        description: String,
        application_id: String,
        users: i32,
    ) -> Self {
        Self {
            id,
            name,
            description,
            application_id,
            users,
        }
    }

    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn users(&self) -> i32 {
        self.users
    }

    pub fn update(&mut self, name: &str, description: &str, application_id: &str, users: i32) {
        self.name = name.trim().to_string();
        self.description = description.trim().to_string();
        self.application_id = application_id.trim().to_string();
        self.users = users;
    }

    /// Checks the invariants a system must satisfy before it is stored
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::validation("System name is required"));
        }
        if self.application_id.is_empty() {
            return Err(DomainError::validation(format!(
                "System {} requires an application id",
                self.name
            )));
        }
        if self.users < 0 {
            return Err(DomainError::validation(format!(
                "System {} cannot have a negative number of users",
                self.name
            )));
        }
        Ok(())
    }
}
