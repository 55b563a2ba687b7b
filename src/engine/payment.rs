//! Payment recording: credits a deal and re-chains its ledger.

use super::timeline::{deal_timeline, rebalance};
use super::BillingError;
use crate::domain::{Deal, Decimal, Payment};
use chrono::NaiveDate;

/// Record a partner payment, returning the updated deal and the stored payment.
///
/// The payment is inserted at its date in timeline order; every later entry is
/// re-chained. A transaction reference can be recorded once per deal.
///
/// # Errors
/// - `Validation` for an empty or duplicate reference or a non-positive amount.
/// - `BalanceIntegrity` when the deal's current ledger does not chain.
pub fn record_payment(
    deal: &Deal,
    transaction_ref: &str,
    amount: Decimal,
    date: NaiveDate,
) -> Result<(Deal, Payment), BillingError> {
    let transaction_ref = transaction_ref.trim();
    if transaction_ref.is_empty() {
        return Err(BillingError::validation("transaction reference is required"));
    }
    if !amount.is_positive() {
        return Err(BillingError::validation(format!(
            "payment amount must be positive, got {}",
            amount
        )));
    }
    if deal
        .payments
        .iter()
        .any(|p| p.transaction_ref == transaction_ref)
    {
        return Err(BillingError::validation(format!(
            "transaction {} already recorded on {}",
            transaction_ref, deal.id
        )));
    }

    deal_timeline(deal)?;

    let mut updated = deal.clone();
    updated.payments.push(Payment::new(
        date,
        amount,
        transaction_ref.to_string(),
        Decimal::zero(),
    ));
    rebalance(&mut updated)?;

    let stored = updated
        .payments
        .last()
        .cloned()
        .ok_or_else(|| BillingError::validation("payment was not stored"))?;
    Ok((updated, stored))
}
