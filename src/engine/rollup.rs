//! Weekly rollup: per-line, per-day and per-week lead and cost figures.
//!
//! Two allocation rules keep the rollup reproducible:
//!
//! - **Deductions.** A day's `invalid` count (capped at the day's gross leads)
//!   is spread over its lines proportionally to line gross leads, by largest
//!   remainder, ties to the earlier line.
//! - **Conversions.** A line's reported `ftds` when present (capped at net);
//!   otherwise `floor(net * conversion_rate)`.
//!
//! The weekly average conversion rate is the simple mean of the daily rates,
//! so a light day weighs as much as a heavy one. It is not lead-weighted.

use super::allocation::allocate_largest_remainder;
use super::{compute_cost, parse_rate, CostBreakdown, RateComponents};
use crate::domain::{DayRecord, Deal, DealId, Decimal, Geo, SubDeal};
use chrono::NaiveDate;
use serde::Serialize;

/// Knobs of the rollup model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupPolicy {
    /// Fallback conversion fraction for lines without reported FTDs.
    pub conversion_rate: Decimal,
}

impl Default for RollupPolicy {
    fn default() -> Self {
        Self {
            conversion_rate: Decimal::new(rust_decimal::Decimal::new(15, 2)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRollup {
    pub geo: Geo,
    pub source: String,
    pub rate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_components: Option<RateComponents>,
    pub gross_leads: u32,
    pub deductions: u32,
    pub deduction_rate: Decimal,
    pub net_leads: u32,
    pub converted: u32,
    pub conversion_rate: Decimal,
    /// `None` when the line's rate descriptor is malformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostBreakdown>,
    pub recorded_bill: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    pub gross_leads: u32,
    pub deductions: u32,
    pub deduction_rate: Decimal,
    pub net_leads: u32,
    pub converted: u32,
    pub conversion_rate: Decimal,
    pub cost: CostBreakdown,
    pub recorded_bill: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub lines: Vec<LineRollup>,
    pub totals: DailyTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTotals {
    pub gross_leads: u32,
    pub deductions: u32,
    pub net_leads: u32,
    pub converted: u32,
    pub cost: CostBreakdown,
    pub recorded_bill: Decimal,
    /// Simple mean of daily conversion rates, in percent.
    pub average_conversion_rate: Decimal,
    /// Deal-level invalid rate, in percent.
    pub invalid_rate: Decimal,
}

/// A line whose cost could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupIssue {
    pub date: NaiveDate,
    pub geo: Geo,
    pub descriptor: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRollup {
    pub deal_id: DealId,
    pub week_number: u32,
    pub days: Vec<DailyRollup>,
    pub totals: WeeklyTotals,
    pub issues: Vec<RollupIssue>,
}

/// Roll up a deal's week with the default policy.
pub fn rollup_week(deal: &Deal) -> WeeklyRollup {
    rollup_week_with(deal, &RollupPolicy::default())
}

/// Roll up a deal's week. Pure; safe to run on any snapshot.
pub fn rollup_week_with(deal: &Deal, policy: &RollupPolicy) -> WeeklyRollup {
    let mut issues = Vec::new();
    let days: Vec<DailyRollup> = deal
        .days
        .iter()
        .map(|day| rollup_day(day, policy, &mut issues))
        .collect();

    let mut totals = WeeklyTotals {
        invalid_rate: deal.invalid_rate(),
        ..WeeklyTotals::default()
    };
    for day in &days {
        totals.gross_leads += day.totals.gross_leads;
        totals.deductions += day.totals.deductions;
        totals.net_leads += day.totals.net_leads;
        totals.converted += day.totals.converted;
        totals.cost = totals.cost + day.totals.cost;
        totals.recorded_bill += day.totals.recorded_bill;
    }
    if !days.is_empty() {
        let rate_sum: Decimal = days.iter().map(|d| d.totals.conversion_rate).sum();
        totals.average_conversion_rate = rate_sum / Decimal::from_count(days.len() as u32);
    }

    WeeklyRollup {
        deal_id: deal.id.clone(),
        week_number: deal.week_number,
        days,
        totals,
        issues,
    }
}

fn rollup_day(day: &DayRecord, policy: &RollupPolicy, issues: &mut Vec<RollupIssue>) -> DailyRollup {
    let weights: Vec<u32> = day.sub_deals.iter().map(|s| s.leads).collect();
    let gross: u32 = weights.iter().sum();
    let deductions = allocate_largest_remainder(day.invalid.min(gross), &weights);

    let lines: Vec<LineRollup> = day
        .sub_deals
        .iter()
        .zip(deductions)
        .map(|(sub_deal, deducted)| rollup_line(day.date, sub_deal, deducted, policy, issues))
        .collect();

    let mut totals = DailyTotals::default();
    for line in &lines {
        totals.gross_leads += line.gross_leads;
        totals.deductions += line.deductions;
        totals.net_leads += line.net_leads;
        totals.converted += line.converted;
        totals.cost = totals.cost + line.cost.unwrap_or_default();
        totals.recorded_bill += line.recorded_bill;
    }
    totals.deduction_rate = Decimal::percentage(totals.deductions, totals.gross_leads);
    totals.conversion_rate = Decimal::percentage(totals.converted, totals.net_leads);

    DailyRollup {
        date: day.date,
        lines,
        totals,
    }
}

fn rollup_line(
    date: NaiveDate,
    sub_deal: &SubDeal,
    deductions: u32,
    policy: &RollupPolicy,
    issues: &mut Vec<RollupIssue>,
) -> LineRollup {
    let gross_leads = sub_deal.leads;
    let net_leads = gross_leads.saturating_sub(deductions);
    let converted = match sub_deal.ftds {
        Some(reported) => reported.min(net_leads),
        None => (Decimal::from_count(net_leads) * policy.conversion_rate).floor_count(),
    };

    let (rate_components, cost) = match parse_rate(&sub_deal.rate) {
        Ok(rate) => (Some(rate), Some(compute_cost(converted, &rate))),
        Err(err) => {
            issues.push(RollupIssue {
                date,
                geo: sub_deal.geo.clone(),
                descriptor: sub_deal.rate.clone(),
                reason: err.to_string(),
            });
            (None, None)
        }
    };

    LineRollup {
        geo: sub_deal.geo.clone(),
        source: sub_deal.source.clone(),
        rate: sub_deal.rate.clone(),
        rate_components,
        gross_leads,
        deductions,
        deduction_rate: Decimal::percentage(deductions, gross_leads),
        net_leads,
        converted,
        conversion_rate: Decimal::percentage(converted, net_leads),
        cost,
        recorded_bill: sub_deal.bill,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn line(geo: &str, leads: u32, rate: &str, ftds: Option<u32>) -> SubDeal {
        SubDeal {
            geo: Geo::new(geo),
            leads,
            rate: rate.to_string(),
            source: "Facebook".to_string(),
            bill: Decimal::zero(),
            ftds,
        }
    }

    fn day_of(invalid: u32, sub_deals: Vec<SubDeal>) -> DayRecord {
        DayRecord {
            date: NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
            total_leads: sub_deals.iter().map(|s| s.leads).sum(),
            invalid,
            daily_bill: Decimal::zero(),
            start_balance: Decimal::zero(),
            end_balance: Decimal::zero(),
            sub_deals,
        }
    }

    #[test]
    fn test_default_policy_rate() {
        assert_eq!(RollupPolicy::default().conversion_rate, d("0.15"));
    }

    #[test]
    fn test_reported_ftds_take_precedence_and_are_capped() {
        let mut issues = Vec::new();
        let day = day_of(0, vec![line("UK", 10, "100+10", Some(4)), line("CA", 10, "100+10", Some(50))]);
        let rollup = rollup_day(&day, &RollupPolicy::default(), &mut issues);
        assert_eq!(rollup.lines[0].converted, 4);
        assert_eq!(rollup.lines[1].converted, 10);
        assert_eq!(rollup.totals.cost.total_cost, d("1540"));
    }

    #[test]
    fn test_invalid_capped_at_gross() {
        let mut issues = Vec::new();
        let day = day_of(50, vec![line("UK", 3, "100+0", None), line("CA", 1, "100+0", None)]);
        let rollup = rollup_day(&day, &RollupPolicy::default(), &mut issues);
        assert_eq!(rollup.totals.deductions, 4);
        assert_eq!(rollup.totals.net_leads, 0);
        assert_eq!(rollup.totals.conversion_rate, Decimal::zero());
        assert_eq!(rollup.totals.deduction_rate, d("100"));
    }

    #[test]
    fn test_malformed_rate_blocks_only_its_line() {
        let mut issues = Vec::new();
        let day = day_of(0, vec![line("UK", 20, "1400+13", None), line("CA", 20, "oops", None)]);
        let rollup = rollup_day(&day, &RollupPolicy::default(), &mut issues);
        assert!(rollup.lines[0].cost.is_some());
        assert!(rollup.lines[1].cost.is_none());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].descriptor, "oops");
        // 20 * 0.15 = 3 conversions at 1582 each on the healthy line only
        assert_eq!(rollup.totals.cost.total_cost, d("4746"));
    }

    #[test]
    fn test_empty_day_guards() {
        let mut issues = Vec::new();
        let rollup = rollup_day(&day_of(0, vec![]), &RollupPolicy::default(), &mut issues);
        assert_eq!(rollup.totals, DailyTotals::default());
    }
}
