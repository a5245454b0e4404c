use crate::error::RefundError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A positive monetary amount.
///
/// Wraps `rust_decimal::Decimal` to guarantee at the type level that
/// refunds and payouts never move a zero or negative sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, RefundError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(RefundError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The amount in the gateway's minor currency unit (paise for INR).
    ///
    /// Returns `None` when the value does not fit an `i64` after the x100
    /// shift; callers treat that as an invalid request.
    pub fn minor_units(&self) -> Option<i64> {
        (self.0 * Decimal::from(100)).round().to_i64()
    }

    /// Sum of a detail/donation amount column, used by the conservation
    /// checks.
    pub fn total<'a, I: IntoIterator<Item = &'a Amount>>(amounts: I) -> Decimal {
        amounts.into_iter().map(|a| a.0).sum()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = RefundError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
