//! Money types with precise decimal arithmetic
//!
//! Amounts use rust_decimal so that plan values and service costs never go
//! through floating point. Comparisons between amounts go through
//! [`compare_amounts`], which ignores the scale of the decimal (`10.5` and
//! `10.50` are the same amount).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    EUR,
    USD,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::EUR => "€",
            Currency::USD => "$",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::EUR),
            "USD" => Ok(Currency::USD),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Compares two decimal amounts numerically
///
/// Equality through `==` on the string form would treat `10.5` and `10.50`
/// as different; this compares the normalized values instead.
pub fn compare_amounts(left: Decimal, right: Decimal) -> Ordering {
    left.normalize().cmp(&right.normalize())
}

/// Returns `percentage` percent of `amount`, rounded to `dp` decimal places
///
/// Fails with [`MoneyError::InvalidAmount`] instead of overflowing.
pub fn percentage_of(amount: Decimal, percentage: Decimal, dp: u32) -> Result<Decimal, MoneyError> {
    amount
        .checked_mul(percentage)
        .and_then(|product| product.checked_div(dec!(100)))
        .map(|share| share.round_dp(dp))
        .ok_or_else(|| MoneyError::InvalidAmount(format!("{}% of {} is out of range", percentage, amount)))
}

/// A monetary amount with associated currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Checked addition that returns an error on currency mismatch or overflow
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        self.amount
            .checked_add(other.amount)
            .map(|sum| Self::new(sum, self.currency))
            .ok_or_else(|| MoneyError::InvalidAmount(format!("{} + {} is out of range", self.amount, other.amount)))
    }

    /// Returns the share of this amount for an allocation percentage,
    /// rounded to the currency's standard decimal places
    pub fn share(&self, percentage: Decimal) -> Result<Money, MoneyError> {
        let amount = percentage_of(self.amount, percentage, self.currency.decimal_places())?;
        Ok(Self::new(amount, self.currency))
    }

    /// Compares two amounts of the same currency, ignoring decimal scale
    pub fn compare(&self, other: &Money) -> Result<Ordering, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(compare_amounts(self.amount, other.amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_amounts_ignores_scale() {
        assert_eq!(compare_amounts(dec!(10.5), dec!(10.50)), Ordering::Equal);
        assert_eq!(compare_amounts(dec!(10.49), dec!(10.5)), Ordering::Less);
    }

    #[test]
    fn test_share_rounds_to_currency() {
        let total = Money::new(dec!(1000.00), Currency::EUR);
        assert_eq!(total.share(dec!(33.333)).unwrap().amount(), dec!(333.33));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let max = Money::new(Decimal::MAX, Currency::EUR);
        let one = Money::new(dec!(1), Currency::EUR);
        assert!(matches!(max.checked_add(&one), Err(MoneyError::InvalidAmount(_))));
        assert!(matches!(max.share(dec!(50)), Err(MoneyError::InvalidAmount(_))));
    }

    #[test]
    fn test_currency_mismatch() {
        let eur = Money::new(dec!(100.00), Currency::EUR);
        let usd = Money::new(dec!(100.00), Currency::USD);

        let result = eur.checked_add(&usd);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!(" eur ".parse::<Currency>().unwrap(), Currency::EUR);
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(MoneyError::UnknownCurrency(_))
        ));
    }
}
