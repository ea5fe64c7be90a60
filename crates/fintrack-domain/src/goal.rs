//! Savings goals and their derived progress view.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, money::Money};

const DAYS_PER_MONTH: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub name: String,
    pub target_amount: Money,
    /// Increased only by contributions, never decreased automatically.
    #[serde(default)]
    pub current_amount: Money,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub icon: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn from_input(input: NewGoal, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            target_amount: input.target_amount,
            current_amount: Money::ZERO,
            deadline: input.deadline,
            icon: input.icon,
            created_at: now,
            updated_at: None,
        }
    }

    /// Computes the progress figures shown next to a goal as of `now`.
    pub fn progress(&self, now: DateTime<Utc>) -> GoalProgress {
        let progress_pct = self
            .current_amount
            .percent_of(self.target_amount)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        let remaining = if self.current_amount >= self.target_amount {
            Money::ZERO
        } else {
            self.target_amount - self.current_amount
        };
        let days_left = days_until(self.deadline, now);
        let months_left = ceil_div(days_left, DAYS_PER_MONTH).max(1);
        let monthly_target = remaining.divide(u32::try_from(months_left).unwrap_or(u32::MAX));

        GoalProgress {
            progress_pct,
            remaining,
            days_left,
            months_left,
            monthly_target,
            is_overdue: days_left < 0,
            is_completed: progress_pct >= Decimal::ONE_HUNDRED,
        }
    }
}

impl Identifiable for Goal {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Timestamped for Goal {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub progress_pct: Decimal,
    pub remaining: Money,
    pub days_left: i64,
    pub months_left: i64,
    pub monthly_target: Money,
    pub is_overdue: bool,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Money,
    pub deadline: NaiveDate,
    pub icon: String,
}

impl NewGoal {
    pub fn new(name: impl Into<String>, target_amount: Money, deadline: NaiveDate) -> Self {
        Self {
            name: name.into(),
            target_amount,
            deadline,
            icon: "🎯".into(),
        }
    }
}

/// Editable goal fields. `current_amount` is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<Money>,
    pub deadline: Option<NaiveDate>,
    pub icon: Option<String>,
}

impl GoalPatch {
    pub fn apply_to(&self, goal: &mut Goal, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            goal.name = name.trim().to_string();
        }
        if let Some(target) = self.target_amount {
            goal.target_amount = target;
        }
        if let Some(deadline) = self.deadline {
            goal.deadline = deadline;
        }
        if let Some(icon) = &self.icon {
            goal.icon = icon.clone();
        }
        goal.touch(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn goal(target: i64, current: i64, deadline: NaiveDate) -> Goal {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut goal = Goal::from_input(
            NewGoal::new("Trip", Money::from_major(target), deadline),
            now,
        );
        goal.current_amount = Money::from_major(current);
        goal
    }

    #[test]
    fn monthly_target_spreads_remaining_amount() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let deadline = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let progress = goal(1000, 250, deadline).progress(now);

        assert_eq!(progress.progress_pct, Decimal::from(25));
        assert_eq!(progress.days_left, 90);
        assert_eq!(progress.months_left, 3);
        assert_eq!(progress.monthly_target, Money::from_major(250));
        assert!(!progress.is_overdue);
        assert!(!progress.is_completed);
    }

    #[test]
    fn overdue_goal_asks_for_full_remaining_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let deadline = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let progress = goal(600, 100, deadline).progress(now);

        assert!(progress.is_overdue);
        assert_eq!(progress.months_left, 1);
        assert_eq!(progress.monthly_target, Money::from_major(500));
    }

    #[test]
    fn completion_when_target_reached() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let deadline = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let progress = goal(500, 650, deadline).progress(now);

        assert!(progress.is_completed);
        assert_eq!(progress.remaining, Money::ZERO);
        assert_eq!(progress.progress_pct, Decimal::from(130));
    }
}
