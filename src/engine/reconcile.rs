//! Reconciliation: cross-checks a deal's recorded figures against its ledger.
//!
//! Unlike the timeline builder, the reconciler keeps going after the first
//! mismatch and reports every one it finds. A broken balance chain is still a
//! hard error, since nothing downstream of it can be trusted.

use super::timeline::{closing_balance, deal_timeline};
use super::BillingError;
use crate::domain::{Deal, DealId, Decimal};
use serde::Serialize;

/// Largest difference tolerated between bill sums recorded at cent precision.
pub fn cent_tolerance() -> Decimal {
    Decimal::new(rust_decimal::Decimal::new(1, 2))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationCheck {
    /// `deal.balance` equals the timeline's closing balance.
    BalanceMatchesTimeline,
    /// Daily bills add up to the final bill.
    DailyBillsMatchFinalBill,
    /// A day's line bills add up to its daily bill.
    LineBillsMatchDailyBill,
    /// `opening + payments - billed == balance`.
    BalanceEquation,
    /// Invalid leads never exceed delivered leads.
    InvalidWithinTotal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub check: ReconciliationCheck,
    /// Deal id or timeline entry id the check was run on.
    pub subject: String,
    pub expected: Decimal,
    pub actual: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub deal_id: DealId,
    pub opening_balance: Decimal,
    pub total_payments: Decimal,
    pub total_billed: Decimal,
    pub final_balance: Decimal,
    pub discrepancies: Vec<Discrepancy>,
}

impl ReconciliationReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Reconcile a deal.
///
/// # Errors
/// `BalanceIntegrity` when the ledger does not chain.
pub fn reconcile(deal: &Deal) -> Result<ReconciliationReport, BillingError> {
    let entries = deal_timeline(deal)?;
    let final_balance = closing_balance(&entries, deal.opening_balance);
    let total_payments = deal.total_payments();
    let total_billed = deal.total_billed();
    let tolerance = cent_tolerance();
    let deal_subject = deal.id.to_string();

    let mut discrepancies = Vec::new();
    let mut flag = |check, subject: &str, expected: Decimal, actual: Decimal| {
        discrepancies.push(Discrepancy {
            check,
            subject: subject.to_string(),
            expected,
            actual,
        });
    };

    if deal.balance != final_balance {
        flag(
            ReconciliationCheck::BalanceMatchesTimeline,
            &deal_subject,
            final_balance,
            deal.balance,
        );
    }

    if !total_billed.approx_eq(deal.final_bill, tolerance) {
        flag(
            ReconciliationCheck::DailyBillsMatchFinalBill,
            &deal_subject,
            deal.final_bill,
            total_billed,
        );
    }

    for day in deal.days.iter().filter(|d| !d.sub_deals.is_empty()) {
        let lines = day.lines_bill();
        if !lines.approx_eq(day.daily_bill, tolerance) {
            flag(
                ReconciliationCheck::LineBillsMatchDailyBill,
                &format!("day:{}", day.date),
                day.daily_bill,
                lines,
            );
        }
    }

    let derived = deal.opening_balance + total_payments - total_billed;
    if derived != deal.balance {
        flag(
            ReconciliationCheck::BalanceEquation,
            &deal_subject,
            derived,
            deal.balance,
        );
    }

    if deal.invalid + deal.resolved_invalid > deal.total_leads {
        flag(
            ReconciliationCheck::InvalidWithinTotal,
            &deal_subject,
            Decimal::from_count(deal.total_leads),
            Decimal::from_count(deal.invalid + deal.resolved_invalid),
        );
    }

    Ok(ReconciliationReport {
        deal_id: deal.id.clone(),
        opening_balance: deal.opening_balance,
        total_payments,
        total_billed,
        final_balance,
        discrepancies,
    })
}
