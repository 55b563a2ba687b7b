//! Deduction impact: preview and commit of additional invalid leads.

use super::allocation::{allocate_largest_remainder, rescale_amounts};
use super::timeline::{deal_timeline, rebalance};
use super::BillingError;
use crate::domain::{Deal, Decimal, DeductionAudit, DeductionReason};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Projected effect of deducting additional invalid leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionImpact {
    pub additional_invalid: u32,
    /// Invalid rate before the deduction, in percent.
    pub current_invalid_rate: Decimal,
    /// Share of the deduction alone, in percent.
    pub additional_rate: Decimal,
    /// `(invalid + additional) / total * 100`.
    pub new_invalid_rate: Decimal,
    /// `total - invalid - resolved_invalid - additional`.
    pub remaining_leads: u32,
    pub current_bill: Decimal,
    /// `final_bill * remaining / total`, unrounded.
    pub updated_bill: Decimal,
}

impl DeductionImpact {
    pub fn bill_reduction(&self) -> Decimal {
        self.current_bill - self.updated_bill
    }

    /// True when the projected invalid rate is strictly above `threshold_pct`.
    pub fn exceeds_threshold(&self, threshold_pct: Decimal) -> bool {
        self.new_invalid_rate > threshold_pct
    }
}

/// Preview a deduction without touching the deal.
///
/// # Errors
/// - `DivisionByZero` when the deal has no delivered leads.
/// - `OverDeduction` when fewer than `additional_invalid` billable leads remain.
pub fn preview_deduction(deal: &Deal, additional_invalid: u32) -> Result<DeductionImpact, BillingError> {
    if deal.total_leads == 0 {
        return Err(BillingError::DivisionByZero {
            deal_id: deal.id.clone(),
        });
    }

    let available = deal.billable_leads();
    let remaining_leads =
        available
            .checked_sub(additional_invalid)
            .ok_or_else(|| BillingError::OverDeduction {
                deal_id: deal.id.clone(),
                requested: additional_invalid,
                available,
            })?;

    let total = Decimal::from_count(deal.total_leads);
    let updated_bill = deal.final_bill * Decimal::from_count(remaining_leads) / total;
    let invalid_after = Decimal::from_count(deal.invalid) + Decimal::from_count(additional_invalid);

    Ok(DeductionImpact {
        additional_invalid,
        current_invalid_rate: deal.invalid_rate(),
        additional_rate: Decimal::percentage(additional_invalid, deal.total_leads),
        new_invalid_rate: invalid_after / total * Decimal::hundred(),
        remaining_leads,
        current_bill: deal.final_bill,
        updated_bill,
    })
}

/// A deduction the operator wants to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionRequest {
    pub count: u32,
    pub reason: DeductionReason,
    pub affected_leads: String,
    pub note: String,
}

/// Commit a deduction, returning the updated deal. The input is untouched.
///
/// The new final bill is the preview's updated bill rounded to cents. Day
/// bills are rescaled by the same factor with cents apportioned by largest
/// remainder, line bills follow their day, and the additional invalid leads
/// are attributed to days by largest remainder over each day's billable leads.
pub fn apply_deduction(
    deal: &Deal,
    request: &DeductionRequest,
    now: DateTime<Utc>,
) -> Result<Deal, BillingError> {
    if request.count == 0 {
        return Err(BillingError::validation("deduction count must be positive"));
    }
    if request.note.trim().is_empty() {
        return Err(BillingError::validation("deduction note is required"));
    }

    // An inconsistent ledger is surfaced, never silently rebalanced.
    deal_timeline(deal)?;
    let impact = preview_deduction(deal, request.count)?;
    let new_bill = impact.updated_bill.round_cents();

    let mut updated = deal.clone();
    updated.invalid += request.count;
    rescale_day_bills(&mut updated, new_bill);
    attribute_invalids_to_days(&mut updated, request.count);
    updated.final_bill = new_bill;
    updated.deductions.push(DeductionAudit {
        id: Uuid::new_v4(),
        count: request.count,
        reason: request.reason,
        affected_leads: request.affected_leads.trim().to_string(),
        note: request.note.trim().to_string(),
        bill_before: deal.final_bill,
        bill_after: new_bill,
        recorded_at: now,
    });
    rebalance(&mut updated)?;

    Ok(updated)
}

fn rescale_day_bills(deal: &mut Deal, new_bill: Decimal) {
    if deal.final_bill.is_zero() {
        return;
    }
    // Days that reconcile to the final bill land on `new_bill` exactly. A
    // partially recorded week keeps its proportional share.
    let daily: Vec<Decimal> = deal.days.iter().map(|d| d.daily_bill).collect();
    let days_total: Decimal = daily.iter().sum();
    let target = (days_total * new_bill / deal.final_bill).round_cents();

    for (day, bill) in deal.days.iter_mut().zip(rescale_amounts(&daily, target)) {
        day.daily_bill = bill;
        let lines: Vec<Decimal> = day.sub_deals.iter().map(|s| s.bill).collect();
        for (line, line_bill) in day.sub_deals.iter_mut().zip(rescale_amounts(&lines, bill)) {
            line.bill = line_bill;
        }
    }
}

fn attribute_invalids_to_days(deal: &mut Deal, count: u32) {
    let weights: Vec<u32> = deal.days.iter().map(|d| d.billable_leads()).collect();
    let capacity: u32 = weights.iter().sum();
    let shares = allocate_largest_remainder(count.min(capacity), &weights);
    for (day, share) in deal.days.iter_mut().zip(shares) {
        day.invalid += share;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DealId;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn bare_deal(total_leads: u32, invalid: u32, final_bill: &str) -> Deal {
        serde_json::from_value(serde_json::json!({
            "id": "deal-1", "partner": "Partner A", "weekNumber": 52,
            "totalLeads": total_leads, "invalid": invalid,
            "finalBill": final_bill.parse::<f64>().unwrap(), "balance": 0
        }))
        .unwrap()
    }

    #[test]
    fn test_preview_reference_figures() {
        let deal = bare_deal(370, 12, "17750");
        let impact = preview_deduction(&deal, 8).unwrap();
        assert_eq!(impact.remaining_leads, 350);
        assert_eq!(impact.new_invalid_rate.round_dp(3), d("5.405"));
        assert_eq!(impact.updated_bill.round_cents(), d("16790.54"));
        assert_eq!(impact.additional_rate.round_dp(1), d("2.2"));
        assert_eq!(impact.current_invalid_rate.round_dp(1), d("3.2"));
    }

    #[test]
    fn test_preview_zero_additional_is_allowed() {
        let deal = bare_deal(100, 0, "1000");
        let impact = preview_deduction(&deal, 0).unwrap();
        assert_eq!(impact.remaining_leads, 100);
        assert_eq!(impact.updated_bill, d("1000"));
        assert!(impact.bill_reduction().is_zero());
    }

    #[test]
    fn test_preview_over_deduction() {
        let deal = bare_deal(20, 15, "100");
        match preview_deduction(&deal, 6) {
            Err(BillingError::OverDeduction {
                deal_id,
                requested,
                available,
            }) => {
                assert_eq!(deal_id, DealId::new("deal-1"));
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("Expected OverDeduction, got {:?}", other),
        }
        assert!(preview_deduction(&deal, 5).is_ok());
    }

    #[test]
    fn test_preview_division_by_zero() {
        let deal = bare_deal(0, 0, "0");
        assert!(matches!(
            preview_deduction(&deal, 0),
            Err(BillingError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_threshold() {
        let deal = bare_deal(100, 5, "1000");
        let impact = preview_deduction(&deal, 3).unwrap();
        assert!(!impact.exceeds_threshold(d("8")));
        let impact = preview_deduction(&deal, 4).unwrap();
        assert!(impact.exceeds_threshold(d("8")));
    }

    #[test]
    fn test_apply_requires_note_and_positive_count() {
        let deal = bare_deal(100, 0, "1000");
        let mut request = DeductionRequest {
            count: 0,
            reason: DeductionReason::Spam,
            affected_leads: String::new(),
            note: "bots".to_string(),
        };
        assert!(matches!(
            apply_deduction(&deal, &request, Utc::now()),
            Err(BillingError::Validation(_))
        ));

        request.count = 2;
        request.note = "   ".to_string();
        assert!(matches!(
            apply_deduction(&deal, &request, Utc::now()),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_without_days_updates_bill_and_audit() {
        let deal = bare_deal(100, 0, "1000");
        let request = DeductionRequest {
            count: 10,
            reason: DeductionReason::Quality,
            affected_leads: " a@x.io ".to_string(),
            note: "goodwill".to_string(),
        };
        let updated = apply_deduction(&deal, &request, Utc::now()).unwrap();
        assert_eq!(updated.invalid, 10);
        assert_eq!(updated.final_bill, d("900"));
        assert_eq!(updated.deductions.len(), 1);
        assert_eq!(updated.deductions[0].affected_leads, "a@x.io");
        assert_eq!(updated.deductions[0].bill_before, d("1000"));
        assert_eq!(updated.deductions[0].bill_after, d("900"));
        assert_eq!(deal.invalid, 0, "input deal must not change");
    }

    fn deal_with_days(final_bill: &str, days: serde_json::Value) -> Deal {
        serde_json::from_value(serde_json::json!({
            "id": "deal-1", "partner": "Partner A", "weekNumber": 52,
            "totalLeads": 300, "invalid": 0, "finalBill": final_bill.parse::<f64>().unwrap(),
            "balance": 0, "openingBalance": 0, "days": days
        }))
        .unwrap()
    }

    fn spam(count: u32) -> DeductionRequest {
        DeductionRequest {
            count,
            reason: DeductionReason::Spam,
            affected_leads: String::new(),
            note: "bots".to_string(),
        }
    }

    #[test]
    fn test_preview_counts_resolved_invalids_as_unbillable() {
        let mut deal = bare_deal(370, 0, "17750");
        deal.resolved_invalid = 12;
        let impact = preview_deduction(&deal, 8).unwrap();
        assert_eq!(impact.remaining_leads, 350);
        match preview_deduction(&deal, 359) {
            Err(BillingError::OverDeduction { available, .. }) => assert_eq!(available, 358),
            other => panic!("Expected OverDeduction, got {:?}", other),
        }
    }

    #[test]
    fn test_day_bills_sum_to_new_final_bill() {
        let deal = deal_with_days(
            "300",
            serde_json::json!([
                {"date": "2023-03-15", "totalLeads": 100, "invalid": 0, "dailyBill": 100,
                 "startBalance": 0, "endBalance": -100},
                {"date": "2023-03-16", "totalLeads": 100, "invalid": 0, "dailyBill": 100,
                 "startBalance": -100, "endBalance": -200},
                {"date": "2023-03-17", "totalLeads": 100, "invalid": 0, "dailyBill": 100,
                 "startBalance": -200, "endBalance": -300}
            ]),
        );
        let updated = apply_deduction(&deal, &spam(1), Utc::now()).unwrap();
        assert_eq!(updated.final_bill, d("299"));
        assert_eq!(updated.total_billed(), d("299"));
        assert_eq!(updated.balance, d("-299"));
    }

    #[test]
    fn test_partial_week_keeps_proportional_share() {
        let deal = deal_with_days(
            "300",
            serde_json::json!([
                {"date": "2023-03-15", "totalLeads": 100, "invalid": 0, "dailyBill": 150,
                 "startBalance": 0, "endBalance": -150}
            ]),
        );
        let updated = apply_deduction(&deal, &spam(30), Utc::now()).unwrap();
        assert_eq!(updated.final_bill, d("270"));
        assert_eq!(updated.days[0].daily_bill, d("135"));
    }

    #[test]
    fn test_zero_bill_line_never_goes_negative() {
        let deal: Deal = serde_json::from_value(serde_json::json!({
            "id": "deal-1", "partner": "Partner A", "weekNumber": 52,
            "totalLeads": 3, "invalid": 0, "finalBill": 2, "balance": -2,
            "days": [
                {"date": "2023-03-15", "totalLeads": 3, "invalid": 0, "dailyBill": 2,
                 "startBalance": 0, "endBalance": -2,
                 "deals": [
                    {"geo": "UK", "leads": 1, "rate": "1+0", "source": "Google", "bill": 1},
                    {"geo": "CA", "leads": 1, "rate": "1+0", "source": "Google", "bill": 1},
                    {"geo": "DE", "leads": 1, "rate": "0+0", "source": "Google", "bill": 0}
                 ]}
            ]
        }))
        .unwrap();
        let updated = apply_deduction(&deal, &spam(1), Utc::now()).unwrap();
        let day = &updated.days[0];
        assert_eq!(day.daily_bill, d("1.33"));
        let bills: Vec<Decimal> = day.sub_deals.iter().map(|s| s.bill).collect();
        assert_eq!(bills, vec![d("0.67"), d("0.66"), d("0")]);
        assert!(bills.iter().all(|b| !b.is_negative()));
        assert_eq!(day.lines_bill(), day.daily_bill);
    }
}
