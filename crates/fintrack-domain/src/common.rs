//! Shared traits and calendar helpers for the finance primitives.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

const SECONDS_PER_DAY: i64 = 86_400;

/// Exposes a stable identifier for entities stored in a collection.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Entities carrying creation and modification provenance.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
    fn touch(&mut self, now: DateTime<Utc>);
}

/// Integer division rounding toward positive infinity.
pub fn ceil_div(value: i64, divisor: i64) -> i64 {
    let floor = value.div_euclid(divisor);
    if value.rem_euclid(divisor) > 0 {
        floor + 1
    } else {
        floor
    }
}

/// Whole days from `now` until the start of `date`, rounded up.
///
/// Negative once the date has passed.
pub fn days_until(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let target = date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    match target {
        Some(target) => ceil_div((target - now).num_seconds(), SECONDS_PER_DAY),
        None => 0,
    }
}

/// Returns `true` when both dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
