//! Read-only reports computed from a ledger snapshot.
//!
//! These functions never fail: entries with a non-positive amount are skipped
//! and an empty snapshot produces zeroed results. All calendar arithmetic is UTC.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use fintrack_domain::{same_month, Money, Transaction, TransactionKind};
use rust_decimal::{prelude::ToPrimitive, RoundingStrategy};

/// Days covered by the trailing expense series of [`monthly_summary`].
pub const SUMMARY_SERIES_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyExpense {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub expense: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
    /// Oldest day first, ending today.
    pub daily_expenses: Vec<DailyExpense>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub total: Money,
    /// Whole percent of the kind's grand total.
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyFlow {
    pub date: NaiveDate,
    pub income: Money,
    pub expense: Money,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodFlow {
    /// Oldest day first, ending today.
    pub days: Vec<DailyFlow>,
    pub total_income: Money,
    pub total_expense: Money,
    pub balance: Money,
}

impl PeriodFlow {
    pub fn daily_income(&self) -> Vec<Money> {
        self.days.iter().map(|day| day.income).collect()
    }

    pub fn daily_expense(&self) -> Vec<Money> {
        self.days.iter().map(|day| day.expense).collect()
    }
}

/// Narrows a transaction list. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    /// Case-insensitive substring of the category name.
    pub category: Option<String>,
}

impl TransactionFilter {
    pub fn kind(kind: TransactionKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if self.kind.is_some_and(|kind| kind != txn.kind) {
            return false;
        }
        match self.category.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => txn
                .category
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionTotals {
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
}

fn counted(txn: &Transaction) -> bool {
    txn.amount.is_positive()
}

/// Income, expense and balance for the calendar month containing `now`, plus
/// a per-day expense series for the last seven days.
///
/// The series only counts entries of the current month, so days before the
/// first of the month read as zero.
pub fn monthly_summary(transactions: &[Transaction], now: DateTime<Utc>) -> MonthlySummary {
    let today = now.date_naive();
    let mut income = Money::ZERO;
    let mut expense = Money::ZERO;
    let mut per_day: HashMap<NaiveDate, Money> = HashMap::new();

    for txn in transactions.iter().filter(|txn| counted(txn)) {
        let date = txn.occurred_at.date_naive();
        if !same_month(date, today) {
            continue;
        }
        match txn.kind {
            TransactionKind::Income => income += txn.amount,
            TransactionKind::Expense => {
                expense += txn.amount;
                *per_day.entry(date).or_default() += txn.amount;
            }
        }
    }

    let daily_expenses = (0..SUMMARY_SERIES_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            DailyExpense {
                date,
                weekday: date.weekday(),
                expense: per_day.get(&date).copied().unwrap_or_default(),
            }
        })
        .collect();

    MonthlySummary {
        year: today.year(),
        month: today.month(),
        income,
        expense,
        balance: income - expense,
        daily_expenses,
    }
}

/// Entries accepted by `filter`, in their original order.
pub fn filter_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|txn| filter.matches(txn))
        .cloned()
        .collect()
}

/// Income, expense and their difference over every entry given.
pub fn summarize(transactions: &[Transaction]) -> TransactionTotals {
    let mut totals = TransactionTotals::default();
    for txn in transactions.iter().filter(|txn| counted(txn)) {
        match txn.kind {
            TransactionKind::Income => totals.income += txn.amount,
            TransactionKind::Expense => totals.expense += txn.amount,
        }
    }
    totals.balance = totals.income - totals.expense;
    totals
}

/// Groups entries of `kind` by category, largest total first.
///
/// Uncategorised entries fall under `fallback`. Ties keep first-seen order.
pub fn category_breakdown(
    transactions: &[Transaction],
    kind: TransactionKind,
    fallback: &str,
) -> Vec<CategoryShare> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, Money> = HashMap::new();

    for txn in transactions
        .iter()
        .filter(|txn| txn.kind == kind && counted(txn))
    {
        let name = txn.category_or(fallback);
        match totals.get_mut(name) {
            Some(total) => *total += txn.amount,
            None => {
                order.push(name.to_string());
                totals.insert(name.to_string(), txn.amount);
            }
        }
    }

    let grand_total: Money = totals.values().sum();
    let mut shares: Vec<CategoryShare> = order
        .into_iter()
        .map(|category| {
            let total = totals.get(&category).copied().unwrap_or_default();
            CategoryShare {
                percentage: whole_percent(total, grand_total),
                category,
                total,
            }
        })
        .collect();
    shares.sort_by(|a, b| b.total.cmp(&a.total));
    shares
}

fn whole_percent(part: Money, total: Money) -> u32 {
    part.percent_of(total)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or_default()
}

/// Per-day income and expense over the `period_days` days ending today.
///
/// Entries dated outside the window, including future-dated ones, are ignored.
/// A zero-length period yields an empty result.
pub fn period_flow(transactions: &[Transaction], period_days: u32, now: DateTime<Utc>) -> PeriodFlow {
    if period_days == 0 {
        return PeriodFlow::default();
    }
    let today = now.date_naive();
    let start = today - Duration::days(i64::from(period_days) - 1);

    let mut days: Vec<DailyFlow> = (0..i64::from(period_days))
        .map(|offset| DailyFlow {
            date: start + Duration::days(offset),
            income: Money::ZERO,
            expense: Money::ZERO,
        })
        .collect();

    for txn in transactions.iter().filter(|txn| counted(txn)) {
        let date = txn.occurred_at.date_naive();
        if date < start || date > today {
            continue;
        }
        let Ok(index) = usize::try_from((date - start).num_days()) else {
            continue;
        };
        if let Some(day) = days.get_mut(index) {
            match txn.kind {
                TransactionKind::Income => day.income += txn.amount,
                TransactionKind::Expense => day.expense += txn.amount,
            }
        }
    }

    let total_income: Money = days.iter().map(|day| day.income).sum();
    let total_expense: Money = days.iter().map(|day| day.expense).sum();
    PeriodFlow {
        days,
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}
