//! Unit tests for the identifier newtypes
//!
//! Tests cover creation, parsing, conversion, and display formatting.

use core_kernel::{
    PlanId, SystemId, UserId, AgreementId, ServiceId, UsersListId, UsersListItemId,
};
use uuid::Uuid;

mod service_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = ServiceId::new();
        let id2 = ServiceId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_generates_time_ordered_ids() {
        let id1 = ServiceId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = ServiceId::new();
        assert!(id1 < id2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ServiceId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_with_and_without_prefix() {
        let original = ServiceId::new();
        let with_prefix: ServiceId = original.to_string().parse().unwrap();
        let without_prefix: ServiceId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, with_prefix);
        assert_eq!(original, without_prefix);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("SVC-not-a-uuid".parse::<ServiceId>().is_err());
    }

    #[test]
    fn test_json_serialization_is_transparent() {
        let id = ServiceId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let deserialized: ServiceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}

#[test]
fn test_prefixes_are_distinct() {
    let prefixes = [
        PlanId::prefix(),
        SystemId::prefix(),
        UserId::prefix(),
        AgreementId::prefix(),
        ServiceId::prefix(),
        UsersListId::prefix(),
        UsersListItemId::prefix(),
    ];

    let mut sorted = prefixes.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), prefixes.len());
}

#[test]
fn test_display_uses_prefix() {
    assert!(PlanId::new().to_string().starts_with("PLN-"));
    assert!(AgreementId::new().to_string().starts_with("AGR-"));
    assert!(UsersListItemId::new().to_string().starts_with("ULI-"));
}
