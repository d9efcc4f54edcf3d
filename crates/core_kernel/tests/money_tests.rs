//! Unit tests for money, currency and amount comparison

use std::cmp::Ordering;

use core_kernel::{compare_amounts, percentage_of, Currency, Money, MoneyError};
use rust_decimal_macros::dec;

mod comparison_tests {
    use super::*;

    #[test]
    fn test_equal_amounts_with_different_scale() {
        assert_eq!(compare_amounts(dec!(120), dec!(120.000)), Ordering::Equal);
    }

    #[test]
    fn test_ordering() {
        assert_eq!(compare_amounts(dec!(99.99), dec!(100)), Ordering::Less);
        assert_eq!(compare_amounts(dec!(100.01), dec!(100)), Ordering::Greater);
    }

    #[test]
    fn test_money_compare_same_currency() {
        let a = Money::new(dec!(10.5), Currency::EUR);
        let b = Money::new(dec!(10.50), Currency::EUR);
        assert_eq!(a.compare(&b).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_money_compare_currency_mismatch() {
        let a = Money::new(dec!(10), Currency::EUR);
        let b = Money::new(dec!(10), Currency::USD);
        assert!(matches!(a.compare(&b), Err(MoneyError::CurrencyMismatch(_, _))));
    }
}

mod allocation_math_tests {
    use super::*;

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(dec!(1500), dec!(50), 2).unwrap(), dec!(750.00));
        assert_eq!(percentage_of(dec!(100), dec!(12.5), 2).unwrap(), dec!(12.50));
    }

    #[test]
    fn test_percentage_of_out_of_range() {
        let err = percentage_of(rust_decimal::Decimal::MAX, dec!(50), 2).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidAmount(_)));
    }

    #[test]
    fn test_share_rounds_to_cents() {
        let total = Money::new(dec!(1001), Currency::USD);
        assert_eq!(total.share(dec!(50)).unwrap().amount(), dec!(500.50));
    }

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(1.123456), Currency::EUR);
        assert_eq!(m.amount(), dec!(1.1235));
    }

    #[test]
    fn test_is_negative() {
        assert!(Money::new(dec!(-1), Currency::EUR).is_negative());
        assert!(!Money::zero(Currency::EUR).is_negative());
    }
}

mod currency_tests {
    use super::*;

    #[test]
    fn test_default_is_eur() {
        assert_eq!(Currency::default(), Currency::EUR);
    }

    #[test]
    fn test_codes_round_trip_through_from_str() {
        for currency in [Currency::EUR, Currency::USD] {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(dec!(12.5), Currency::EUR).to_string(), "€ 12.50");
    }
}
