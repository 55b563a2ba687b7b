use leadledger::domain::{Deal, Decimal, TimelineEntry};
use leadledger::engine::reconcile::ReconciliationCheck;
use leadledger::engine::{
    build_timeline, build_timeline_from, deal_timeline, filter_timeline, reconcile, BillingError,
    TimelineFilter,
};

fn fixture_deals() -> Vec<Deal> {
    serde_json::from_str(include_str!("../fixtures/deals.json")).unwrap()
}

fn deal_1() -> Deal {
    fixture_deals().remove(0)
}

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

#[test]
fn test_fixture_timeline_order_and_balances() {
    let deal = deal_1();
    let entries = deal_timeline(&deal).unwrap();
    let ids: Vec<String> = entries.iter().map(TimelineEntry::id).collect();
    assert_eq!(
        ids,
        vec![
            "payment:0x1234...5678",
            "day:2023-03-15",
            "day:2023-03-16",
            "day:2023-03-17",
        ]
    );
    assert_eq!(entries.last().unwrap().end_balance(), deal.balance);
}

#[test]
fn test_build_timeline_is_idempotent() {
    let deal = deal_1();
    let first = build_timeline(&deal.payments, &deal.days).unwrap();
    let second = build_timeline(&deal.payments, &deal.days).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_input_order_does_not_matter() {
    let deal = deal_1();
    let mut days = deal.days.clone();
    days.reverse();
    let sorted = build_timeline(&deal.payments, &deal.days).unwrap();
    let shuffled = build_timeline(&deal.payments, &days).unwrap();
    let dates = |entries: &[TimelineEntry]| entries.iter().map(|e| e.date()).collect::<Vec<_>>();
    assert_eq!(dates(&sorted), dates(&shuffled));
}

#[test]
fn test_corrupted_second_entry_is_named() {
    let mut deal = deal_1();
    deal.days[0].start_balance = d("19999");

    match build_timeline(&deal.payments, &deal.days) {
        Err(BillingError::BalanceIntegrity {
            entry_id,
            field,
            expected,
            actual,
        }) => {
            assert_eq!(entry_id, "day:2023-03-15");
            assert_eq!(field, "startBalance");
            assert_eq!(expected, d("20000"));
            assert_eq!(actual, d("19999"));
        }
        other => panic!("Expected BalanceIntegrity, got {:?}", other),
    }
}

#[test]
fn test_nonzero_opening_balance() {
    let mut deal = deal_1();
    for payment in &mut deal.payments {
        payment.start_balance = payment.start_balance + d("500");
        payment.end_balance = payment.end_balance + d("500");
    }
    for day in &mut deal.days {
        day.start_balance = day.start_balance + d("500");
        day.end_balance = day.end_balance + d("500");
    }
    assert!(build_timeline(&deal.payments, &deal.days).is_err());
    let entries = build_timeline_from(&deal.payments, &deal.days, d("500")).unwrap();
    assert_eq!(entries.last().unwrap().end_balance(), d("2750"));
}

#[test]
fn test_filter_by_date_and_amount() {
    let deal = deal_1();
    let entries = deal_timeline(&deal).unwrap();

    let by_date = TimelineFilter {
        date_contains: Some("03-16".to_string()),
        amount_contains: None,
    };
    let hits = filter_timeline(&entries, &by_date);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].start_balance(), d("15250"));

    let by_amount = TimelineFilter {
        date_contains: None,
        amount_contains: Some("20000".to_string()),
    };
    let hits = filter_timeline(&entries, &by_amount);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].is_payment());

    let both = TimelineFilter {
        date_contains: Some("2023-03".to_string()),
        amount_contains: Some("50".to_string()),
    };
    // 4750, 5850, 7150
    assert_eq!(filter_timeline(&entries, &both).len(), 3);
}

#[test]
fn test_fixture_deals_reconcile() {
    for deal in fixture_deals() {
        let report = reconcile(&deal).unwrap();
        assert!(
            report.is_consistent(),
            "{} has discrepancies: {:?}",
            deal.id,
            report.discrepancies
        );
    }
}

#[test]
fn test_headline_figures_that_disagree_with_ledger() {
    let mut deal = fixture_deals().remove(1);
    deal.total_leads = 280;
    deal.invalid = 8;
    deal.final_bill = d("13500");
    deal.balance = d("1800");

    let report = reconcile(&deal).unwrap();
    let checks: Vec<_> = report.discrepancies.iter().map(|x| x.check).collect();
    assert_eq!(
        checks,
        vec![
            ReconciliationCheck::BalanceMatchesTimeline,
            ReconciliationCheck::DailyBillsMatchFinalBill,
            ReconciliationCheck::BalanceEquation,
        ]
    );
    assert_eq!(report.final_balance, d("10800"));
}
