//! Week selector options derived from the deal collection.

use crate::domain::{Deal, Decimal};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekOption {
    /// `week-<n>`.
    pub identifier: String,
    pub week_number: u32,
    pub label: String,
    /// `None` when none of the week's deals has billing days yet.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `"<start> - <end>"`, for display.
    pub date_range: Option<String>,
    pub deal_count: usize,
    /// Sum of the week's final bills.
    pub total_value: Decimal,
}

impl WeekOption {
    fn empty(week_number: u32) -> Self {
        Self {
            identifier: format!("week-{}", week_number),
            week_number,
            label: format!("Week {}", week_number),
            start_date: None,
            end_date: None,
            date_range: None,
            deal_count: 0,
            total_value: Decimal::zero(),
        }
    }

    fn absorb(&mut self, deal: &Deal) {
        self.deal_count += 1;
        self.total_value += deal.final_bill;
        for day in &deal.days {
            self.start_date = Some(self.start_date.map_or(day.date, |d| d.min(day.date)));
            self.end_date = Some(self.end_date.map_or(day.date, |d| d.max(day.date)));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            self.date_range = Some(format!("{} - {}", start, end));
        }
    }
}

/// One option per distinct week number, newest week first.
pub fn week_options(deals: &[Deal]) -> Vec<WeekOption> {
    let mut weeks: BTreeMap<u32, WeekOption> = BTreeMap::new();
    for deal in deals {
        weeks
            .entry(deal.week_number)
            .or_insert_with(|| WeekOption::empty(deal.week_number))
            .absorb(deal);
    }
    weeks.into_values().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(id: &str, week: u32, bill: u32, dates: &[&str]) -> Deal {
        let days: Vec<_> = dates
            .iter()
            .map(|date| {
                serde_json::json!({"date": date, "totalLeads": 1, "invalid": 0, "dailyBill": 0,
                                   "startBalance": 0, "endBalance": 0})
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "id": id, "partner": "P", "weekNumber": week, "totalLeads": 1,
            "invalid": 0, "finalBill": bill, "balance": 0, "days": days
        }))
        .unwrap()
    }

    #[test]
    fn test_groups_by_week_newest_first() {
        let deals = vec![
            deal("a", 51, 100, &["2023-03-08"]),
            deal("b", 52, 200, &["2023-03-16", "2023-03-15"]),
            deal("c", 52, 300, &["2023-03-17"]),
        ];
        let options = week_options(&deals);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].identifier, "week-52");
        assert_eq!(options[0].label, "Week 52");
        assert_eq!(options[0].deal_count, 2);
        assert_eq!(options[0].total_value, Decimal::from_count(500));
        assert_eq!(options[0].start_date, NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(options[0].end_date, NaiveDate::from_ymd_opt(2023, 3, 17));
        assert_eq!(options[0].date_range.as_deref(), Some("2023-03-15 - 2023-03-17"));
        assert_eq!(options[1].week_number, 51);
    }

    #[test]
    fn test_week_without_days_has_no_range() {
        let options = week_options(&[deal("a", 3, 0, &[])]);
        assert_eq!(options[0].start_date, None);
        assert_eq!(options[0].date_range, None);
        assert!(week_options(&[]).is_empty());
    }
}
