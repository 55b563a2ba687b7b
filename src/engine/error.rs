use crate::domain::{DealId, Decimal};
use crate::engine::closure::ClosurePrecondition;
use thiserror::Error;

/// Failures of the billing engine. Every variant is recoverable by the caller;
/// none of them leaves a Deal partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed rate {descriptor:?}: {reason}")]
    MalformedRate { descriptor: String, reason: String },

    #[error("Balance integrity error at {entry_id}: {field} expected {expected}, found {actual}")]
    BalanceIntegrity {
        entry_id: String,
        field: &'static str,
        expected: Decimal,
        actual: Decimal,
    },

    #[error(
        "Over-deduction on {deal_id}: {requested} additional invalid leads requested, {available} billable leads left"
    )]
    OverDeduction {
        deal_id: DealId,
        requested: u32,
        available: u32,
    },

    #[error("Division by zero on {deal_id}: no leads delivered")]
    DivisionByZero { deal_id: DealId },

    #[error("Closure preconditions not met for {deal_id}: {}", join_unmet(.unmet))]
    PreconditionNotMet {
        deal_id: DealId,
        unmet: Vec<ClosurePrecondition>,
    },
}

impl BillingError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        BillingError::Validation(msg.into())
    }
}

fn join_unmet(unmet: &[ClosurePrecondition]) -> String {
    unmet
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
