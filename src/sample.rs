//! Demo content loaded into an empty data set.

use chrono::{DateTime, Duration, Utc};
use fintrack_domain::{Money, NewTransaction};

pub(crate) fn transactions(now: DateTime<Utc>) -> Vec<NewTransaction> {
    vec![
        NewTransaction::income("Salary", Money::from_major(5000))
            .with_category("Salary")
            .occurred_at(now),
        NewTransaction::expense("Groceries", Money::from_minor(23650))
            .with_category("Food")
            .occurred_at(now - Duration::days(1)),
        NewTransaction::expense("Rent", Money::from_major(1200))
            .with_category("Housing")
            .occurred_at(now - Duration::days(2)),
        NewTransaction::income("Freelance", Money::from_major(800))
            .with_category("Freelance")
            .occurred_at(now - Duration::days(3)),
    ]
}

/// `(title, message, read)` entries pushed alongside the sample transactions,
/// oldest first.
pub(crate) fn notifications() -> [(&'static str, &'static str, bool); 3] {
    [
        ("Bill reminder", "Your card bill is due in 3 days", true),
        ("Payment processed", "A payment of 236.50 was processed", false),
        ("Deposit received", "You received a deposit of 5,000.00", false),
    ]
}
