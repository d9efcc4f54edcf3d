//! User entity and roles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use core_kernel::UserId;

use crate::error::DomainError;

/// Role assigned to an application user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Validator,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Validator => "validator",
            UserRole::Viewer => "viewer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "validator" => Ok(UserRole::Validator),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(DomainError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// An application user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    email: String,
    name: String,
    role: UserRole,
}

impl User {
    pub fn create(email: &str, name: &str, role: UserRole) -> Result<Self, DomainError> {
        let user = Self {
            id: UserId::new(),
            email: normalize_email(email),
            name: name.trim().to_string(),
            role,
        };
        user.validate()?;
        Ok(user)
    }

    /// Rebuilds a user from its stored shape
    pub fn restore(id: UserId, email: String, name: String, role: UserRole) -> Self {
        Self {
            id,
            email,
            name,
            role,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    pub fn change_role(&mut self, role: UserRole) {
        self.role = role;
    }

    /// Admins manage the catalog (plans, systems, users)
    pub fn can_manage(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Admins and validators may approve or reject services
    pub fn can_validate(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Validator)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_plausible_email(&self.email) {
            return Err(DomainError::validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        if self.name.is_empty() {
            return Err(DomainError::validation("User name is required"));
        }
        Ok(())
    }
}

/// Trims and lower-cases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let user = User::create("  Jane.Doe@Example.COM ", " Jane ", UserRole::Viewer).unwrap();
        assert_eq!(user.email(), "jane.doe@example.com");
        assert_eq!(user.name(), "Jane");
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(User::create("not-an-email", "Jane", UserRole::Viewer).is_err());
    }

    #[test]
    fn test_role_permissions() {
        let mut user = User::create("a@b.io", "A", UserRole::Viewer).unwrap();
        assert!(!user.can_validate());

        user.change_role(UserRole::Validator);
        assert!(user.can_validate());
        assert!(!user.can_manage());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(" Admin ".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("owner".parse::<UserRole>().is_err());
    }
}
