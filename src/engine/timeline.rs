//! Ledger timeline: merges payments and daily billing into one
//! chronological, balance-verified sequence.
//!
//! The builder verifies balances and never repairs them. The rebalancer is
//! the only writer of balances and is used exclusively by committed
//! mutations (payment recording, deduction application).

use super::BillingError;
use crate::domain::{sort_entries_deterministic, DayRecord, Deal, Decimal, Payment, TimelineEntry};

/// Merge both streams and sort them into timeline order.
fn merge(payments: &[Payment], days: &[DayRecord]) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = payments
        .iter()
        .enumerate()
        .map(|(seq, payment)| TimelineEntry::Payment {
            seq,
            payment: payment.clone(),
        })
        .chain(days.iter().enumerate().map(|(seq, day)| TimelineEntry::DailyBilling {
            seq,
            day: day.clone(),
        }))
        .collect();
    sort_entries_deterministic(&mut entries);
    entries
}

/// Build the timeline starting from a zero balance.
///
/// # Errors
/// `BillingError::BalanceIntegrity` on the first entry whose balances do not
/// chain or do not match its own amount.
pub fn build_timeline(
    payments: &[Payment],
    days: &[DayRecord],
) -> Result<Vec<TimelineEntry>, BillingError> {
    build_timeline_from(payments, days, Decimal::zero())
}

/// Build the timeline starting from an explicit opening balance.
pub fn build_timeline_from(
    payments: &[Payment],
    days: &[DayRecord],
    opening_balance: Decimal,
) -> Result<Vec<TimelineEntry>, BillingError> {
    let entries = merge(payments, days);
    verify_chain(&entries, opening_balance)?;
    Ok(entries)
}

/// Build the timeline of a deal, honouring its opening balance.
pub fn deal_timeline(deal: &Deal) -> Result<Vec<TimelineEntry>, BillingError> {
    build_timeline_from(&deal.payments, &deal.days, deal.opening_balance)
}

/// Verify that a sorted sequence chains from `opening_balance`.
pub fn verify_chain(entries: &[TimelineEntry], opening_balance: Decimal) -> Result<(), BillingError> {
    let mut expected_start = opening_balance;
    for entry in entries {
        if entry.start_balance() != expected_start {
            return Err(BillingError::BalanceIntegrity {
                entry_id: entry.id(),
                field: "startBalance",
                expected: expected_start,
                actual: entry.start_balance(),
            });
        }
        let expected_end = entry.start_balance() + entry.delta();
        if entry.end_balance() != expected_end {
            return Err(BillingError::BalanceIntegrity {
                entry_id: entry.id(),
                field: "endBalance",
                expected: expected_end,
                actual: entry.end_balance(),
            });
        }
        expected_start = entry.end_balance();
    }
    Ok(())
}

/// Final balance of a verified timeline.
pub fn closing_balance(entries: &[TimelineEntry], opening_balance: Decimal) -> Decimal {
    entries
        .last()
        .map(|e| e.end_balance())
        .unwrap_or(opening_balance)
}

/// Rewrite every payment and day balance of `deal` in timeline order, then
/// set `deal.balance` to the closing balance and re-verify.
pub fn rebalance(deal: &mut Deal) -> Result<(), BillingError> {
    let order = merge(&deal.payments, &deal.days);
    let mut running = deal.opening_balance;

    for entry in &order {
        match entry {
            TimelineEntry::Payment { seq, .. } => {
                let payment = &mut deal.payments[*seq];
                payment.start_balance = running;
                payment.end_balance = running + payment.amount;
                running = payment.end_balance;
            }
            TimelineEntry::DailyBilling { seq, .. } => {
                let day = &mut deal.days[*seq];
                day.start_balance = running;
                day.end_balance = running - day.daily_bill;
                running = day.end_balance;
            }
        }
    }

    deal.balance = running;
    deal_timeline(deal).map(|_| ())
}

/// Substring predicates over the rendered date and amount of an entry.
///
/// Empty predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineFilter {
    pub date_contains: Option<String>,
    pub amount_contains: Option<String>,
}

impl TimelineFilter {
    pub fn is_empty(&self) -> bool {
        active(&self.date_contains).is_none() && active(&self.amount_contains).is_none()
    }

    pub fn matches(&self, entry: &TimelineEntry) -> bool {
        let date_ok = active(&self.date_contains)
            .map_or(true, |needle| entry.date().to_string().contains(needle));
        let amount_ok = active(&self.amount_contains)
            .map_or(true, |needle| entry.amount().to_canonical_string().contains(needle));
        date_ok && amount_ok
    }
}

fn active(predicate: &Option<String>) -> Option<&str> {
    predicate
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Select the entries matching `filter`. Balances are carried as recorded.
pub fn filter_timeline(entries: &[TimelineEntry], filter: &TimelineFilter) -> Vec<TimelineEntry> {
    entries
        .iter()
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect()
}
