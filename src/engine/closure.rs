//! Week closure: the `Open -> Closed` transition and its gate.
//!
//! Closure is terminal. Corrections after closure go through deduction audit
//! records, never through reopening.

use super::timeline::deal_timeline;
use super::BillingError;
use crate::domain::{ClosureMode, ClosureRecord, Deal, Decimal, WeekStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three acknowledgements an operator gives before closing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureConfirmations {
    #[serde(default)]
    pub invalids_processed: bool,
    #[serde(default)]
    pub deductions_verified: bool,
    #[serde(default)]
    pub final_bill_confirmed: bool,
}

impl ClosureConfirmations {
    pub fn all() -> Self {
        Self {
            invalids_processed: true,
            deductions_verified: true,
            final_bill_confirmed: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseWeekRequest {
    pub confirmations: ClosureConfirmations,
    pub mode: Option<ClosureMode>,
    pub note: Option<String>,
    /// Closure with prejudice.
    pub do_not_renew: bool,
}

impl CloseWeekRequest {
    fn trimmed_note(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// One unmet closure gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum ClosurePrecondition {
    AlreadyClosed,
    PendingInvalids { count: u32 },
    InvalidsNotConfirmed,
    DeductionsNotVerified,
    FinalBillNotConfirmed,
    ModeNotChosen,
    NoteRequired { balance: Decimal },
}

impl std::fmt::Display for ClosurePrecondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosurePrecondition::AlreadyClosed => write!(f, "week is already closed"),
            ClosurePrecondition::PendingInvalids { count } => {
                write!(f, "{} invalid leads still pending", count)
            }
            ClosurePrecondition::InvalidsNotConfirmed => {
                write!(f, "invalids processed not confirmed")
            }
            ClosurePrecondition::DeductionsNotVerified => {
                write!(f, "additional deductions not verified")
            }
            ClosurePrecondition::FinalBillNotConfirmed => write!(f, "final bill not confirmed"),
            ClosurePrecondition::ModeNotChosen => write!(f, "closure mode not chosen"),
            ClosurePrecondition::NoteRequired { balance } => {
                write!(f, "note required to close with remaining balance {}", balance)
            }
        }
    }
}

/// Every gate `request` leaves unmet on `deal`, in a fixed order.
pub fn unmet_preconditions(deal: &Deal, request: &CloseWeekRequest) -> Vec<ClosurePrecondition> {
    let mut unmet = Vec::new();

    if deal.is_closed() {
        unmet.push(ClosurePrecondition::AlreadyClosed);
    }
    if deal.invalid > 0 {
        unmet.push(ClosurePrecondition::PendingInvalids {
            count: deal.invalid,
        });
    }

    let confirmations = &request.confirmations;
    if !confirmations.invalids_processed {
        unmet.push(ClosurePrecondition::InvalidsNotConfirmed);
    }
    if !confirmations.deductions_verified {
        unmet.push(ClosurePrecondition::DeductionsNotVerified);
    }
    if !confirmations.final_bill_confirmed {
        unmet.push(ClosurePrecondition::FinalBillNotConfirmed);
    }

    match request.mode {
        None => unmet.push(ClosurePrecondition::ModeNotChosen),
        Some(ClosureMode::RemainingBalance)
            if deal.balance.is_positive() && request.trimmed_note().is_none() =>
        {
            unmet.push(ClosurePrecondition::NoteRequired {
                balance: deal.balance,
            });
        }
        Some(_) => {}
    }

    unmet
}

/// Close a week, returning the closed deal and its closure record.
///
/// Re-closing a deal that already carries a closure record replays that
/// record instead of failing, so a double submission is harmless.
///
/// # Errors
/// - `BalanceIntegrity` when the deal's ledger does not chain.
/// - `PreconditionNotMet` listing every unmet gate.
pub fn close_week(
    deal: &Deal,
    request: &CloseWeekRequest,
    now: DateTime<Utc>,
) -> Result<(Deal, ClosureRecord), BillingError> {
    if let (WeekStatus::Closed, Some(record)) = (deal.status, &deal.closure) {
        return Ok((deal.clone(), record.clone()));
    }

    deal_timeline(deal)?;

    let unmet = unmet_preconditions(deal, request);
    let mode = match (unmet.is_empty(), request.mode) {
        (true, Some(mode)) => mode,
        _ => {
            return Err(BillingError::PreconditionNotMet {
                deal_id: deal.id.clone(),
                unmet,
            })
        }
    };

    let record = ClosureRecord {
        id: Uuid::new_v4(),
        deal_id: deal.id.clone(),
        mode,
        note: request.trimmed_note(),
        balance_at_closure: deal.balance,
        do_not_renew: request.do_not_renew,
        closed_at: now,
    };

    let mut closed = deal.clone();
    closed.status = WeekStatus::Closed;
    closed.closure = Some(record.clone());
    Ok((closed, record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(invalid: u32, balance: u32) -> Deal {
        serde_json::from_value(serde_json::json!({
            "id": "deal-1", "partner": "Partner A", "weekNumber": 52,
            "totalLeads": 370, "invalid": invalid, "finalBill": 17750,
            "balance": balance, "openingBalance": balance
        }))
        .unwrap()
    }

    fn request(mode: Option<ClosureMode>, note: Option<&str>) -> CloseWeekRequest {
        CloseWeekRequest {
            confirmations: ClosureConfirmations::all(),
            mode,
            note: note.map(str::to_string),
            do_not_renew: false,
        }
    }

    #[test]
    fn test_pending_invalids_block_regardless_of_confirmations() {
        let deal = deal(3, 0);
        let err = close_week(&deal, &request(Some(ClosureMode::ZeroBalance), None), Utc::now())
            .unwrap_err();
        match err {
            BillingError::PreconditionNotMet { unmet, .. } => {
                assert_eq!(unmet, vec![ClosurePrecondition::PendingInvalids { count: 3 }]);
            }
            other => panic!("Expected PreconditionNotMet, got {:?}", other),
        }
    }

    #[test]
    fn test_all_unmet_gates_reported_together() {
        let deal = deal(0, 10);
        let unmet = unmet_preconditions(&deal, &CloseWeekRequest::default());
        assert_eq!(
            unmet,
            vec![
                ClosurePrecondition::InvalidsNotConfirmed,
                ClosurePrecondition::DeductionsNotVerified,
                ClosurePrecondition::FinalBillNotConfirmed,
                ClosurePrecondition::ModeNotChosen,
            ]
        );
    }

    #[test]
    fn test_whitespace_note_does_not_count() {
        let deal = deal(0, 2250);
        let unmet = unmet_preconditions(&deal, &request(Some(ClosureMode::RemainingBalance), Some("  ")));
        assert_eq!(unmet.len(), 1);
        assert!(matches!(unmet[0], ClosurePrecondition::NoteRequired { .. }));
    }

    #[test]
    fn test_zero_mode_needs_no_note() {
        let deal = deal(0, 2250);
        let (closed, record) =
            close_week(&deal, &request(Some(ClosureMode::ZeroBalance), None), Utc::now()).unwrap();
        assert_eq!(closed.status, WeekStatus::Closed);
        assert_eq!(record.mode, ClosureMode::ZeroBalance);
        assert_eq!(record.note, None);
    }

    #[test]
    fn test_reclose_replays_record() {
        let deal = deal(0, 0);
        let (closed, first) =
            close_week(&deal, &request(Some(ClosureMode::ZeroBalance), None), Utc::now()).unwrap();
        let (_, second) = close_week(&closed, &CloseWeekRequest::default(), Utc::now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_closed_without_record_is_rejected() {
        let mut deal = deal(0, 0);
        deal.status = WeekStatus::Closed;
        let err = close_week(&deal, &request(Some(ClosureMode::ZeroBalance), None), Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("already closed"));
    }
}
