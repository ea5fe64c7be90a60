mod common;

use std::collections::HashMap;

use chrono::Duration;
use fintrack::{
    config::Config,
    domain::{Frequency, Money, NewRecurringRule, NewTransaction, TransactionKind},
    engine::{summarize, Clock, CoreError, TransactionFilter},
    FintrackError, Session,
};
use rust_decimal::Decimal;

use common::memory_session;

#[test]
fn sample_data_populates_an_empty_session_once() {
    let (session, _) = memory_session();

    assert!(session.seed_sample_data().expect("seed"));
    assert!(!session.seed_sample_data().expect("second seed"));

    let ledger = session.ledger();
    assert_eq!(ledger.list_transactions().expect("list").len(), 4);
    assert_eq!(ledger.balance().expect("balance"), Money::from_minor(436350));
    assert_eq!(session.categories().list().expect("categories").len(), 12);
    assert_eq!(session.notifications().unread_count().expect("unread"), 2);
    let notifications = session.notifications().list().expect("list");
    assert_eq!(notifications[0].title, "Deposit received");
    let reminder = notifications
        .iter()
        .find(|n| n.title == "Bill reminder")
        .expect("reminder");
    assert!(reminder.read);
}

#[test]
fn filtered_transactions_carry_their_own_totals() {
    let (session, _) = memory_session();
    session.seed_sample_data().expect("seed");

    let expenses = session
        .find_transactions(&TransactionFilter::kind(TransactionKind::Expense))
        .expect("expenses");
    assert_eq!(expenses.len(), 2);
    let totals = summarize(&expenses);
    assert_eq!(totals.income, Money::ZERO);
    assert_eq!(totals.expense, Money::from_minor(143650));
    assert_eq!(totals.balance, Money::from_minor(-143650));

    let freelance = session
        .find_transactions(&TransactionFilter::category("LANCE"))
        .expect("freelance");
    assert_eq!(freelance.len(), 1);
    assert_eq!(summarize(&freelance).balance, Money::from_major(800));

    let everything = session
        .find_transactions(&TransactionFilter::default())
        .expect("all");
    assert_eq!(summarize(&everything).balance, Money::from_minor(436350));
}

#[test]
fn clearing_data_reseeds_the_sample_set() {
    let (session, _) = memory_session();
    session.seed_sample_data().expect("seed");
    session
        .ledger()
        .create(NewTransaction::expense("Laptop", Money::from_major(900)))
        .expect("expense");
    session
        .scheduler()
        .create(NewRecurringRule::new(
            TransactionKind::Expense,
            "Gym",
            Money::from_major(40),
            Frequency::Monthly,
        ))
        .expect("rule");
    session.notifications().mark_all_as_read().expect("read all");

    session.clear_data().expect("clear");

    assert_eq!(session.ledger().list_transactions().expect("list").len(), 4);
    assert_eq!(
        session.ledger().balance().expect("balance"),
        Money::from_minor(436350)
    );
    assert!(session.scheduler().list().expect("rules").is_empty());
    assert_eq!(session.notifications().unread_count().expect("unread"), 2);
    assert!(!session.ledger().reconcile().expect("reconcile").corrected);
}

#[test]
fn dashboard_reports_follow_the_ledger() {
    let (session, _) = memory_session();
    let ledger = session.ledger();
    ledger
        .create(NewTransaction::income("Salary", Money::from_major(5000)).with_category("Salary"))
        .expect("salary");
    ledger
        .create(NewTransaction::expense("Groceries", Money::from_minor(23650)).with_category("Food"))
        .expect("groceries");
    ledger
        .create(NewTransaction::expense("Rent", Money::from_major(1200)).with_category("Housing"))
        .expect("rent");
    ledger
        .create(NewTransaction::expense("Misc", Money::from_major(20)))
        .expect("uncategorised");

    let summary = session.monthly_summary().expect("summary");
    assert_eq!(summary.income, Money::from_major(5000));
    assert_eq!(summary.expense, Money::from_minor(145650));
    assert_eq!(summary.daily_expenses.len(), 7);

    let shares = session
        .category_breakdown(TransactionKind::Expense)
        .expect("breakdown");
    assert_eq!(shares[0].category, "Housing");
    assert_eq!(shares.last().expect("last").category, "Other");

    let flow = session.period_flow(30).expect("flow");
    assert_eq!(flow.days.len(), 30);
    assert_eq!(flow.total_expense, Money::from_minor(145650));

    let mut pct = HashMap::new();
    pct.insert("Housing".to_string(), Decimal::from(-10));
    let projection = session.simulate(Decimal::ZERO, &pct).expect("simulate");
    assert_eq!(projection.delta, Money::from_major(120));
    assert_eq!(projection.yearly_delta, Money::from_major(1440));
}

#[test]
fn configured_labels_reach_generated_entries() {
    let (_, clock) = memory_session();
    let config = Config {
        recurring_suffix: " [auto]".into(),
        transfer_category: "Outgoing".into(),
        fallback_category: "Misc".into(),
        ..Config::default()
    };
    let session = Session::in_memory(config, clock.clone());

    session
        .scheduler()
        .create(NewRecurringRule::new(
            TransactionKind::Income,
            "Allowance",
            Money::from_major(10),
            Frequency::Weekly,
        ))
        .expect("rule");
    clock.advance(Duration::days(7));
    let report = session.generate_due().expect("generate");
    assert_eq!(report.generated[0].description, "Allowance [auto]");

    let change = session
        .ledger()
        .transfer("Bob", Money::from_major(4))
        .expect("transfer");
    assert_eq!(change.transaction.category.as_deref(), Some("Outgoing"));
    assert_eq!(change.balance, Money::from_major(6));
    assert_eq!(change.transaction.occurred_at, clock.now());

    session
        .ledger()
        .create(NewTransaction::expense("Snack", Money::from_major(1)))
        .expect("uncategorised");
    let shares = session
        .category_breakdown(TransactionKind::Expense)
        .expect("breakdown");
    assert!(shares.iter().any(|share| share.category == "Misc"));
}

#[test]
fn memory_sessions_have_no_backups() {
    let (session, _) = memory_session();
    assert!(matches!(
        session.backup(None),
        Err(FintrackError::BackupsUnavailable)
    ));
    assert!(matches!(
        session.backup_config(None),
        Err(FintrackError::ConfigUnavailable)
    ));
}

#[test]
fn core_errors_pass_through_the_facade() {
    let (session, _) = memory_session();
    let err = session
        .ledger()
        .transfer("Alice", Money::from_major(1))
        .expect_err("empty balance");
    assert!(matches!(err, CoreError::InsufficientFunds { .. }));
    assert_eq!(err.to_string(), "Insufficient funds");
}
