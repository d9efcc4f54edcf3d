//! Users list aggregate
//!
//! The people behind a system's share of a service for one agreement year and
//! revision. The list owns its items; the user count is always derived from
//! them.

use serde::{Deserialize, Serialize};

use core_kernel::{ServiceId, SystemId, UsersListId, UsersListItemId};

use crate::error::DomainError;
use crate::user::{is_plausible_email, normalize_email};

/// Input fields of a list item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersListItemData {
    pub name: String,
    pub email: String,
    pub corp_user_id: String,
    pub area: String,
    pub cost_center: String,
}

/// One person in a users list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersListItem {
    id: UsersListItemId,
    name: String,
    email: String,
    corp_user_id: String,
    area: String,
    cost_center: String,
}

impl UsersListItem {
    pub fn create(data: UsersListItemData) -> Result<Self, DomainError> {
        let item = Self::restore(UsersListItemId::new(), data);
        item.validate()?;
        Ok(item)
    }

    /// Rebuilds an item from its stored shape, normalizing its fields
    pub fn restore(id: UsersListItemId, data: UsersListItemData) -> Self {
        Self {
            id,
            name: data.name.trim().to_string(),
            email: normalize_email(&data.email),
            corp_user_id: data.corp_user_id.trim().to_string(),
            area: data.area.trim().to_string(),
            cost_center: data.cost_center.trim().to_string(),
        }
    }

    pub fn id(&self) -> UsersListItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn corp_user_id(&self) -> &str {
        &self.corp_user_id
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn cost_center(&self) -> &str {
        &self.cost_center
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::validation("User name is required"));
        }
        if !is_plausible_email(&self.email) {
            return Err(DomainError::validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}

/// Users of one system for a service, per agreement year and revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersList {
    id: UsersListId,
    service_id: ServiceId,
    system_id: SystemId,
    year: i32,
    revision: i32,
    items: Vec<UsersListItem>,
}

impl UsersList {
    /// Creates an empty list
    pub fn create(service_id: ServiceId, system_id: SystemId, year: i32, revision: i32) -> Self {
        Self::restore(UsersListId::new(), service_id, system_id, year, revision, Vec::new())
    }

    pub fn restore(
        id: UsersListId,
        service_id: ServiceId,
        system_id: SystemId,
        year: i32,
        revision: i32,
        items: Vec<UsersListItem>,
    ) -> Self {
        Self {
            id,
            service_id,
            system_id,
            year,
            revision,
            items,
        }
    }

    pub fn id(&self) -> UsersListId {
        self.id
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn system_id(&self) -> SystemId {
        self.system_id
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn revision(&self) -> i32 {
        self.revision
    }

    pub fn items(&self) -> &[UsersListItem] {
        &self.items
    }

    /// Number of users, always the number of items
    pub fn users_number(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find_item(&self, id: UsersListItemId) -> Option<&UsersListItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn find_item_by_email(&self, email: &str) -> Option<&UsersListItem> {
        let email = normalize_email(email);
        self.items.iter().find(|i| i.email == email)
    }

    /// Appends an item; an email may appear only once per list
    pub fn add_item(&mut self, item: UsersListItem) -> Result<(), DomainError> {
        if self.find_item_by_email(&item.email).is_some() {
            return Err(DomainError::validation(format!(
                "{} is already in the users list",
                item.email
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes an item, returning whether it was present
    pub fn remove_item(&mut self, id: UsersListItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(email: &str) -> UsersListItemData {
        UsersListItemData {
            name: " Ana ".to_string(),
            email: email.to_string(),
            corp_user_id: " C001 ".to_string(),
            area: " IT ".to_string(),
            cost_center: " CC-10 ".to_string(),
        }
    }

    #[test]
    fn test_item_fields_are_trimmed() {
        let item = UsersListItem::create(data(" Ana@Corp.COM ")).unwrap();
        assert_eq!(item.email(), "ana@corp.com");
        assert_eq!(item.name(), "Ana");
        assert_eq!(item.corp_user_id(), "C001");
        assert_eq!(item.area(), "IT");
        assert_eq!(item.cost_center(), "CC-10");
    }

    #[test]
    fn test_add_and_remove_track_users_number() {
        let mut list = UsersList::create(ServiceId::new(), SystemId::new(), 2025, 0);
        let first = UsersListItem::create(data("a@corp.com")).unwrap();
        let first_id = first.id();

        list.add_item(first).unwrap();
        list.add_item(UsersListItem::create(data("b@corp.com")).unwrap()).unwrap();
        assert_eq!(list.users_number(), 2);

        assert!(list.remove_item(first_id));
        assert!(!list.remove_item(first_id));
        assert_eq!(list.users_number(), 1);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut list = UsersList::create(ServiceId::new(), SystemId::new(), 2025, 0);
        list.add_item(UsersListItem::create(data("a@corp.com")).unwrap()).unwrap();
        let err = list
            .add_item(UsersListItem::create(data(" A@CORP.com")).unwrap())
            .unwrap_err();
        assert_eq!(err.to_string(), "a@corp.com is already in the users list");
        assert_eq!(list.users_number(), 1);
    }
}
