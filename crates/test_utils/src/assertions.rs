//! Custom Test Assertions
//!
//! Assertion helpers for the agreement domain that print both sides in
//! domain terms when they fail.

use std::cmp::Ordering;
use std::fmt::Display;

use rust_decimal::Decimal;

use core_kernel::{compare_amounts, Money};
use domain_agreement::{Plan, Service, FULL_ALLOCATION};

/// Asserts that two amounts are equal regardless of scale
pub fn assert_amount_eq(actual: Decimal, expected: Decimal) {
    assert_eq!(
        compare_amounts(actual, expected),
        Ordering::Equal,
        "Amounts differ: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts currency and amount of a money value
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_amount_eq(actual.amount(), expected.amount());
}

/// Asserts that two plans carry the same values, ignoring identity
pub fn assert_same_plan(actual: &Plan, expected: &Plan) {
    assert!(
        actual.same_values(expected),
        "Plans differ: actual=({}, {}, {}, {}), expected=({}, {}, {}, {})",
        actual.code(),
        actual.description(),
        actual.euro(),
        actual.plan_date(),
        expected.code(),
        expected.description(),
        expected.euro(),
        expected.plan_date()
    );
}

/// Asserts that a service is active and fully allocated
pub fn assert_service_active(service: &Service) {
    assert!(
        service.is_active(),
        "Expected active service, total allocation is {}",
        service.total_allocation()
    );
    assert_amount_eq(service.total_allocation(), FULL_ALLOCATION);
}

/// Asserts that a service is not active
pub fn assert_service_inactive(service: &Service) {
    assert!(
        !service.is_active(),
        "Expected inactive service, total allocation is {}",
        service.total_allocation()
    );
}

/// Asserts that a result failed with exactly `message`
pub fn assert_error_message<T, E: Display>(result: Result<T, E>, message: &str) {
    match result {
        Ok(_) => panic!("Expected error '{}', got Ok", message),
        Err(err) => assert_eq!(err.to_string(), message),
    }
}
