//! Property-Based Test Generators
//!
//! Proptest strategies producing values that respect the domain's
//! construction rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::Currency;
use domain_agreement::UsersListItemData;

/// Strategy for generating supported currencies
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![Just(Currency::EUR), Just(Currency::USD)]
}

/// Strategy for generating non-negative amounts with two decimal places
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Strategy for generating allocation percentages (0.00 to 100.00)
pub fn allocation_strategy() -> impl Strategy<Value = Decimal> {
    (0u32..=10_000u32).prop_map(|n| Decimal::new(n as i64, 2))
}

/// Strategy for splitting 100% into `parts` allocations
///
/// Every element is a whole-cent percentage and the elements sum to exactly
/// 100.
pub fn full_allocation_split_strategy(parts: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(1u32..1_000u32, parts.max(1)).prop_map(|weights| {
        let total: u32 = weights.iter().sum();
        let mut cents: Vec<i64> = weights
            .iter()
            .map(|w| (*w as i64 * 10_000) / total as i64)
            .collect();
        let assigned: i64 = cents.iter().sum();
        if let Some(last) = cents.last_mut() {
            *last += 10_000 - assigned;
        }
        cents.into_iter().map(|c| Decimal::new(c, 2)).collect()
    })
}

/// Strategy for generating e-mail addresses in mixed case
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-zA-Z]{1,12}", "[a-zA-Z]{1,10}", prop_oneof![Just("com"), Just("org"), Just("net")])
        .prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
}

/// Strategy for generating valid users list item data
pub fn users_list_item_strategy() -> impl Strategy<Value = UsersListItemData> {
    ("[A-Z][a-z]{1,10}", email_strategy(), "C[0-9]{4}", "[A-Z]{2,4}", "CC-[0-9]{3}").prop_map(
        |(name, email, corp_user_id, area, cost_center)| UsersListItemData {
            name,
            email,
            corp_user_id,
            area,
            cost_center,
        },
    )
}
