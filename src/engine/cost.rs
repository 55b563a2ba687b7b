//! Cost breakdown for converted leads under a compound rate.

use super::RateComponents;
use crate::domain::Decimal;
use serde::Serialize;
use std::iter::Sum;
use std::ops::Add;

/// Cost split into its flat (CPA) and percentage (CRG) parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub flat_cost: Decimal,
    pub percent_cost: Decimal,
    pub total_cost: Decimal,
}

impl CostBreakdown {
    pub fn zero() -> Self {
        Self::default()
    }
}

impl Add for CostBreakdown {
    type Output = CostBreakdown;

    fn add(self, rhs: CostBreakdown) -> CostBreakdown {
        CostBreakdown {
            flat_cost: self.flat_cost + rhs.flat_cost,
            percent_cost: self.percent_cost + rhs.percent_cost,
            total_cost: self.total_cost + rhs.total_cost,
        }
    }
}

impl Sum for CostBreakdown {
    fn sum<I: Iterator<Item = CostBreakdown>>(iter: I) -> CostBreakdown {
        iter.fold(CostBreakdown::zero(), |acc, c| acc + c)
    }
}

/// Compute the cost of `converted` leads.
///
/// Only the converted count is billed; gross and net volumes feed the
/// conversion model upstream and do not enter the formula.
///
/// `flat = converted * flat_amount`, `percent = flat * percent_rate`,
/// `total = flat + percent`. Zero conversions cost nothing.
pub fn compute_cost(converted: u32, rate: &RateComponents) -> CostBreakdown {
    if converted == 0 {
        return CostBreakdown::zero();
    }
    let flat_cost = Decimal::from_count(converted) * rate.flat_amount;
    let percent_cost = flat_cost * rate.percent_rate;
    CostBreakdown {
        flat_cost,
        percent_cost,
        total_cost: flat_cost + percent_cost,
    }
}
