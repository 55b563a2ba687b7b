//! Stable timeline ordering for deterministic balance chaining.

use crate::domain::TimelineEntry;
use chrono::NaiveDate;

/// Stable ordering key for timeline entries.
///
/// Balances are cumulative, so the order must be a total order that never
/// depends on sort stability.
/// Ordering: date -> kind (payment before daily billing) -> source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimelineOrderingKey {
    /// Entry date (primary sort).
    pub date: NaiveDate,
    /// 0 for payments, 1 for daily billing (secondary sort).
    pub kind_rank: u8,
    /// Position within the source collection (tertiary sort).
    pub seq: usize,
}

impl TimelineOrderingKey {
    /// Create an ordering key from an entry.
    pub fn from_entry(entry: &TimelineEntry) -> Self {
        TimelineOrderingKey {
            date: entry.date(),
            kind_rank: entry.kind_rank(),
            seq: entry.seq(),
        }
    }

    /// Returns true if entry_a should come before entry_b.
    pub fn should_come_before(entry_a: &TimelineEntry, entry_b: &TimelineEntry) -> bool {
        Self::from_entry(entry_a) < Self::from_entry(entry_b)
    }
}

/// Sort timeline entries deterministically.
pub fn sort_entries_deterministic(entries: &mut [TimelineEntry]) {
    entries.sort_by_key(TimelineOrderingKey::from_entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayRecord, Decimal, Payment};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, day).unwrap()
    }

    fn payment(day: u32, seq: usize) -> TimelineEntry {
        TimelineEntry::Payment {
            seq,
            payment: Payment::new(date(day), Decimal::one(), format!("tx{}", seq), Decimal::zero()),
        }
    }

    fn billing(day: u32, seq: usize) -> TimelineEntry {
        TimelineEntry::DailyBilling {
            seq,
            day: DayRecord {
                date: date(day),
                total_leads: 0,
                invalid: 0,
                daily_bill: Decimal::one(),
                start_balance: Decimal::one(),
                end_balance: Decimal::zero(),
                sub_deals: vec![],
            },
        }
    }

    #[test]
    fn test_ordering_by_date() {
        assert!(TimelineOrderingKey::should_come_before(&billing(14, 0), &payment(15, 0)));
        assert!(!TimelineOrderingKey::should_come_before(&payment(15, 0), &billing(14, 0)));
    }

    #[test]
    fn test_payment_before_billing_on_same_date() {
        assert!(TimelineOrderingKey::should_come_before(&payment(15, 3), &billing(15, 0)));
    }

    #[test]
    fn test_same_kind_same_date_keeps_source_order() {
        assert!(TimelineOrderingKey::should_come_before(&payment(15, 0), &payment(15, 1)));
    }

    #[test]
    fn test_sort_entries_deterministic() {
        let mut entries = vec![billing(16, 1), billing(15, 0), payment(15, 0), payment(14, 1)];
        sort_entries_deterministic(&mut entries);

        let ids: Vec<String> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["payment:tx1", "payment:tx0", "day:2023-03-15", "day:2023-03-16"]);
    }
}
