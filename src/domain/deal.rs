//! Deal aggregate: one partner's billing relationship for one week.

use crate::domain::{ClosureRecord, DealId, Decimal, DeductionAudit, Geo, ResolutionAudit, WeekStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A partner payment (credit event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub date: NaiveDate,
    /// Credited amount, always positive.
    pub amount: Decimal,
    /// Transaction reference supplied by the payer.
    #[serde(alias = "txHash")]
    pub transaction_ref: String,
    pub start_balance: Decimal,
    pub end_balance: Decimal,
}

impl Payment {
    /// Create a payment whose end balance follows from its start balance.
    pub fn new(
        date: NaiveDate,
        amount: Decimal,
        transaction_ref: String,
        start_balance: Decimal,
    ) -> Self {
        Self {
            date,
            amount,
            transaction_ref,
            start_balance,
            end_balance: start_balance + amount,
        }
    }
}

/// One geo/source billing line within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubDeal {
    pub geo: Geo,
    /// Gross leads delivered on this line.
    pub leads: u32,
    /// Compound rate descriptor, `"<flat>+<percent>"`.
    pub rate: String,
    /// Traffic source label (e.g., "Facebook").
    pub source: String,
    pub bill: Decimal,
    /// Converted leads reported by the partner, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftds: Option<u32>,
}

/// One day's aggregate billing event (debit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub date: NaiveDate,
    pub total_leads: u32,
    pub invalid: u32,
    pub daily_bill: Decimal,
    pub start_balance: Decimal,
    pub end_balance: Decimal,
    #[serde(default, alias = "deals")]
    pub sub_deals: Vec<SubDeal>,
}

impl DayRecord {
    /// Leads of the day not yet marked invalid.
    pub fn billable_leads(&self) -> u32 {
        self.total_leads.saturating_sub(self.invalid)
    }

    /// Sum of the day's line bills.
    pub fn lines_bill(&self) -> Decimal {
        self.sub_deals.iter().map(|s| s.bill).sum()
    }
}

/// One partner's billing relationship for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub partner: String,
    pub week_number: u32,
    pub total_leads: u32,
    /// Invalid leads still pending resolution.
    pub invalid: u32,
    /// Invalid leads already processed through resolution.
    #[serde(default)]
    pub resolved_invalid: u32,
    pub final_bill: Decimal,
    pub balance: Decimal,
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub status: WeekStatus,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub days: Vec<DayRecord>,
    #[serde(default)]
    pub deductions: Vec<DeductionAudit>,
    #[serde(default)]
    pub resolutions: Vec<ResolutionAudit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure: Option<ClosureRecord>,
    /// Bumped by the repository on every accepted commit.
    #[serde(default)]
    pub version: u64,
}

impl Deal {
    /// Current invalid rate in percent (0 when no leads were delivered).
    pub fn invalid_rate(&self) -> Decimal {
        Decimal::percentage(self.invalid, self.total_leads)
    }

    /// Leads neither pending as invalid nor already resolved as invalid.
    pub fn billable_leads(&self) -> u32 {
        self.total_leads
            .saturating_sub(self.invalid)
            .saturating_sub(self.resolved_invalid)
    }

    pub fn total_payments(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn total_billed(&self) -> Decimal {
        self.days.iter().map(|d| d.daily_bill).sum()
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }
}
