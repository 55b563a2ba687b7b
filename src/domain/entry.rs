//! Timeline entry: the tagged union of the two ledger event kinds.

use crate::domain::{DayRecord, Decimal, Payment};
use chrono::NaiveDate;
use serde::Serialize;

/// A derived, balance-annotated ledger event. Never persisted.
///
/// `seq` is the entry's position within its source collection and is the
/// final tie-breaker of the timeline ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    Payment { seq: usize, payment: Payment },
    DailyBilling { seq: usize, day: DayRecord },
}

impl TimelineEntry {
    /// Stable identifier used in diagnostics: `payment:<ref>` or `day:<date>`.
    pub fn id(&self) -> String {
        match self {
            TimelineEntry::Payment { payment, .. } => {
                format!("payment:{}", payment.transaction_ref)
            }
            TimelineEntry::DailyBilling { day, .. } => format!("day:{}", day.date),
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            TimelineEntry::Payment { payment, .. } => payment.date,
            TimelineEntry::DailyBilling { day, .. } => day.date,
        }
    }

    pub fn seq(&self) -> usize {
        match self {
            TimelineEntry::Payment { seq, .. } | TimelineEntry::DailyBilling { seq, .. } => *seq,
        }
    }

    /// Same-date rank: payments settle before the day's billing.
    pub fn kind_rank(&self) -> u8 {
        match self {
            TimelineEntry::Payment { .. } => 0,
            TimelineEntry::DailyBilling { .. } => 1,
        }
    }

    /// Unsigned amount: payment amount or daily bill.
    pub fn amount(&self) -> Decimal {
        match self {
            TimelineEntry::Payment { payment, .. } => payment.amount,
            TimelineEntry::DailyBilling { day, .. } => day.daily_bill,
        }
    }

    /// Signed effect on the balance.
    pub fn delta(&self) -> Decimal {
        match self {
            TimelineEntry::Payment { payment, .. } => payment.amount,
            TimelineEntry::DailyBilling { day, .. } => -day.daily_bill,
        }
    }

    pub fn start_balance(&self) -> Decimal {
        match self {
            TimelineEntry::Payment { payment, .. } => payment.start_balance,
            TimelineEntry::DailyBilling { day, .. } => day.start_balance,
        }
    }

    pub fn end_balance(&self) -> Decimal {
        match self {
            TimelineEntry::Payment { payment, .. } => payment.end_balance,
            TimelineEntry::DailyBilling { day, .. } => day.end_balance,
        }
    }

    pub fn is_payment(&self) -> bool {
        matches!(self, TimelineEntry::Payment { .. })
    }
}
