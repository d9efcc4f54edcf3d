//! User use cases

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};

use core_kernel::UserId;
use domain_agreement::{User, UserRepository, UserRole};

use crate::error::UseCaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

pub struct CreateUserUseCase {
    users: Arc<dyn UserRepository>,
}

impl CreateUserUseCase {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Creates a user; the e-mail must not be registered yet, in any case
    #[instrument(skip(self), fields(email = %input.email))]
    pub async fn execute(&self, input: CreateUserInput) -> Result<User, UseCaseError> {
        let user = User::create(&input.email, &input.name, input.role)?;
        if self.users.find_by_email(user.email()).await?.is_some() {
            return Err(UseCaseError::validation(format!(
                "User with email {} already exists",
                user.email()
            )));
        }
        self.users.insert(&user).await?;
        Ok(user)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeUserRoleInput {
    pub actor_id: UserId,
    pub user_id: UserId,
    pub role: UserRole,
}

pub struct ChangeUserRoleUseCase {
    users: Arc<dyn UserRepository>,
}

impl ChangeUserRoleUseCase {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Changes a user's role; only an admin may do this
    #[instrument(skip(self), fields(actor_id = %input.actor_id, user_id = %input.user_id))]
    pub async fn execute(&self, input: ChangeUserRoleInput) -> Result<User, UseCaseError> {
        let actor = self
            .users
            .find(input.actor_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("User", input.actor_id.as_uuid()))?;
        if !actor.can_manage() {
            return Err(UseCaseError::validation(format!(
                "User {} is not allowed to change roles",
                actor.email()
            )));
        }

        let mut user = self
            .users
            .find(input.user_id)
            .await?
            .ok_or_else(|| UseCaseError::not_found("User", input.user_id.as_uuid()))?;
        let previous = user.role();
        user.change_role(input.role);
        self.users.update(&user).await?;

        info!(from = %previous, to = %user.role(), "user role changed");
        Ok(user)
    }
}
