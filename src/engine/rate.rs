//! Compound rate descriptor parsing.
//!
//! A descriptor reads `"<flat>+<percent>"`, e.g. `"1400+13"`: a flat 1400 per
//! converted lead plus 13% of that flat spend on top.

use super::BillingError;
use crate::domain::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// Parsed form of a rate descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateComponents {
    /// Flat amount per converted lead (CPA).
    pub flat_amount: Decimal,
    /// Percentage component as a fraction: 13% is 0.13 (CRG).
    pub percent_rate: Decimal,
}

impl RateComponents {
    /// Full cost of one converted lead, flat plus percentage.
    pub fn cost_per_conversion(&self) -> Decimal {
        self.flat_amount * (Decimal::one() + self.percent_rate)
    }
}

impl FromStr for RateComponents {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rate(s)
    }
}

/// Parse a compound rate descriptor.
///
/// # Errors
/// `BillingError::MalformedRate` when the `+` delimiter is missing, either side
/// is not a number, or either side is negative.
pub fn parse_rate(descriptor: &str) -> Result<RateComponents, BillingError> {
    let malformed = |reason: &str| BillingError::MalformedRate {
        descriptor: descriptor.to_string(),
        reason: reason.to_string(),
    };

    let (flat_str, percent_str) = descriptor
        .split_once('+')
        .ok_or_else(|| malformed("missing '+' delimiter"))?;

    let flat_amount = Decimal::from_str_canonical(flat_str.trim())
        .map_err(|_| malformed("flat amount is not a number"))?;
    let percent = Decimal::from_str_canonical(percent_str.trim())
        .map_err(|_| malformed("percentage is not a number"))?;

    if flat_amount.is_negative() {
        return Err(malformed("flat amount is negative"));
    }
    if percent.is_negative() {
        return Err(malformed("percentage is negative"));
    }

    Ok(RateComponents {
        flat_amount,
        percent_rate: percent / Decimal::hundred(),
    })
}
