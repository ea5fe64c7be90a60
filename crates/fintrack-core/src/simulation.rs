//! What-if projections over the current month's income and spending.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fintrack_domain::{same_month, Money, Transaction, TransactionKind};
use rust_decimal::Decimal;

/// Lowest meaningful adjustment: a category cut to zero.
pub fn min_adjustment_pct() -> Decimal {
    -Decimal::ONE_HUNDRED
}

/// Months used to annualise a monthly delta.
const MONTHS_PER_YEAR: i64 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
}

/// Current-month inputs for [`simulate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationBaseline {
    pub income_total: Money,
    /// Expense totals per category, largest first.
    pub category_totals: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProjection {
    pub category: String,
    pub current: Money,
    pub adjustment_pct: Decimal,
    pub simulated: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub current_income: Money,
    pub current_expense: Money,
    pub current_balance: Money,
    pub simulated_income: Money,
    pub simulated_expense: Money,
    pub simulated_balance: Money,
    /// Simulated balance minus current balance.
    pub delta: Money,
    pub yearly_delta: Money,
    pub categories: Vec<CategoryProjection>,
}

/// Income total and per-category expense totals for the month containing `now`.
pub fn simulation_baseline(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    fallback: &str,
) -> SimulationBaseline {
    let today = now.date_naive();
    let mut baseline = SimulationBaseline::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for txn in transactions.iter().filter(|txn| txn.amount.is_positive()) {
        let date = txn.occurred_at.date_naive();
        if !same_month(date, today) {
            continue;
        }
        match txn.kind {
            TransactionKind::Income => baseline.income_total += txn.amount,
            TransactionKind::Expense => {
                let name = txn.category_or(fallback);
                match index.get(name) {
                    Some(&position) => baseline.category_totals[position].total += txn.amount,
                    None => {
                        index.insert(name.to_string(), baseline.category_totals.len());
                        baseline.category_totals.push(CategoryTotal {
                            category: name.to_string(),
                            total: txn.amount,
                        });
                    }
                }
            }
        }
    }

    baseline
        .category_totals
        .sort_by(|a, b| b.total.cmp(&a.total));
    baseline
}

/// Projects income and expenses after percentage adjustments.
///
/// Each category total becomes `total * (1 + pct / 100)`, missing entries in
/// `per_category_pct` mean no change. Percentages below -100 are clamped so a
/// category can be eliminated but never turned into income.
/// There is no upper bound; figures beyond the decimal range saturate.
pub fn simulate(
    category_totals: &[CategoryTotal],
    income_total: Money,
    income_pct: Decimal,
    per_category_pct: &HashMap<String, Decimal>,
) -> SimulationResult {
    let categories: Vec<CategoryProjection> = category_totals
        .iter()
        .map(|entry| {
            let pct = per_category_pct
                .get(&entry.category)
                .copied()
                .unwrap_or_default()
                .max(min_adjustment_pct());
            CategoryProjection {
                category: entry.category.clone(),
                current: entry.total,
                adjustment_pct: pct,
                simulated: entry.total.adjust_by_percent(pct),
            }
        })
        .collect();

    let current_expense: Money = categories.iter().map(|c| c.current).sum();
    let simulated_expense: Money = categories.iter().map(|c| c.simulated).sum();
    let simulated_income = income_total.adjust_by_percent(income_pct.max(min_adjustment_pct()));

    let current_balance = income_total - current_expense;
    let simulated_balance = simulated_income - simulated_expense;
    let delta = simulated_balance - current_balance;

    SimulationResult {
        current_income: income_total,
        current_expense,
        current_balance,
        simulated_income,
        simulated_expense,
        simulated_balance,
        delta,
        yearly_delta: delta.multiply(MONTHS_PER_YEAR),
        categories,
    }
}
